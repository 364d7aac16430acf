use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use crm_core::error::CrmError;

/// HTTP mapping for [`CrmError`]. Bodies are always `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError(pub CrmError);

impl From<CrmError> for ApiError {
    fn from(err: CrmError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            CrmError::MissingCredential => {
                (StatusCode::UNAUTHORIZED, CrmError::MissingCredential.to_string())
            }
            CrmError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            CrmError::Upstream { status, body } => {
                tracing::warn!(status, "Upstream request failed");
                // Upstream status passes through; an out-of-range code becomes 502.
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, body)
            }
            other => {
                tracing::error!("Internal error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
