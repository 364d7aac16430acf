pub mod error;
pub mod routes;
pub mod state;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use crm_core::config::AppConfig;
use crm_core::error::CrmError;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

/// Header carrying the caller's upstream credential.
pub const API_KEY_HEADER: &str = "x-api-key";

const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization, x-api-key";

/// Upstream credential taken from `x-api-key`, forwarded as a bearer token.
#[derive(Debug, Clone)]
pub struct Credential(pub String);

/// Middleware that requires a non-empty `x-api-key` header.
///
/// The value is stored as a [`Credential`] request extension. OPTIONS
/// requests pass through untouched.
async fn require_api_key(mut req: Request, next: Next) -> Response {
    if *req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    match key {
        Some(key) => {
            req.extensions_mut().insert(Credential(key));
            next.run(req).await
        }
        None => ApiError(CrmError::MissingCredential).into_response(),
    }
}

/// Middleware that attaches permissive CORS headers to successful responses.
async fn cors_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    if response.status().is_success() {
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        );
    }
    response
}

/// Build the axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = state.config.server.cors;

    // Credentialed routes (metrics, lookups).
    let mut api = routes::api_routes(cors).route_layer(middleware::from_fn(require_api_key));
    if cors {
        api = api.route_layer(middleware::from_fn(cors_headers));
    }

    // Public routes (health).
    let public = routes::health_routes();

    Router::new()
        .merge(api)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(config.clone())?;
    let router = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(
        "Starting server on {} (upstream {}, API version {})",
        addr,
        config.upstream.base_url,
        config.upstream.api_version
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
