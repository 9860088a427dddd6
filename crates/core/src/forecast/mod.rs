use crate::config::Settings;
use crate::market::MarketDataClient;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

pub mod http;
pub mod trend;

/// Produces a ready-to-render figure covering recent history plus `horizon_days`.
/// The returned document is opaque to the dashboard and rendered as-is.
#[async_trait::async_trait]
pub trait Forecaster: Send + Sync {
    fn name(&self) -> &'static str;

    async fn forecast(&self, ticker: &str, horizon_days: u32) -> Result<Value>;
}

/// Remote forecaster when `FORECASTER_BASE_URL` is set, built-in trend model otherwise.
pub fn from_settings(
    settings: &Settings,
    market: Arc<dyn MarketDataClient>,
) -> Result<Arc<dyn Forecaster>> {
    if settings.forecaster_base_url.is_some() {
        let client = http::HttpForecaster::from_settings(settings)?;
        tracing::info!(forecaster = client.name(), "using remote forecaster");
        return Ok(Arc::new(client));
    }
    let model = trend::TrendForecaster::from_env(market);
    tracing::info!(forecaster = model.name(), "using built-in forecaster");
    Ok(Arc::new(model))
}
