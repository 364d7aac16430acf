use crm_analytics::{CatalogService, Classifier, MetricsAggregator};
use crm_core::config::AppConfig;
use crm_core::error::Result;
use crm_core::{CrmApi, HttpCrmClient};
use std::sync::Arc;

/// Shared application state for the server.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub aggregator: Arc<MetricsAggregator>,
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    /// State backed by the HTTP client for `config.upstream`.
    pub fn new(config: AppConfig) -> Result<Self> {
        let api: Arc<dyn CrmApi> = Arc::new(HttpCrmClient::new(&config.upstream)?);
        Ok(Self::with_api(config, api))
    }

    pub fn with_api(config: AppConfig, api: Arc<dyn CrmApi>) -> Self {
        Self {
            config,
            aggregator: Arc::new(MetricsAggregator::new(api.clone(), Classifier::default())),
            catalog: Arc::new(CatalogService::new(api)),
        }
    }
}
