//! Wire shapes of the Yahoo Finance chart and quoteSummary endpoints.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: ChartIndicators,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartMeta {
    #[serde(default, rename = "gmtoffset")]
    pub gmt_offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseColumn>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdjCloseColumn {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case("Not Found")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    pub quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSummaryBody {
    #[serde(default)]
    pub result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteSummaryResult {
    #[serde(default, rename = "assetProfile")]
    pub asset_profile: Option<AssetProfile>,
    #[serde(default)]
    pub price: Option<PriceModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetProfile {
    #[serde(default, rename = "longBusinessSummary")]
    pub long_business_summary: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceModule {
    #[serde(default, rename = "shortName")]
    pub short_name: Option<String>,
}
