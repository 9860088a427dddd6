use crate::domain::profile::CompanyProfile;
use crate::domain::series::{HistoryWindow, PriceSeries};
use anyhow::Result;

pub mod types;
pub mod yahoo;

/// Source of company metadata and daily price history.
///
/// Unknown tickers yield an empty profile or series rather than an error;
/// errors are reserved for transport and decoding failures.
#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile>;

    async fn fetch_history(&self, ticker: &str, window: HistoryWindow) -> Result<PriceSeries>;
}
