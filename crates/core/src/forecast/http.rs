use crate::config::{env_or, Settings};
use crate::forecast::Forecaster;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const FORECAST_PATH: &str = "/forecast";

/// Delegates to an external prediction service speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpForecaster {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ForecastRequest<'a> {
    ticker: &'a str,
    horizon_days: u32,
}

impl HttpForecaster {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_forecaster_base_url()?.to_string();
        let timeout_secs = env_or("FORECASTER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build forecaster http client")?;

        Ok(Self { http, base_url })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), FORECAST_PATH)
    }
}

#[async_trait::async_trait]
impl Forecaster for HttpForecaster {
    fn name(&self) -> &'static str {
        "external_http_json"
    }

    async fn forecast(&self, ticker: &str, horizon_days: u32) -> Result<Value> {
        let res = self
            .http
            .post(self.url())
            .json(&ForecastRequest {
                ticker,
                horizon_days,
            })
            .send()
            .await
            .context("forecaster request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read forecaster response")?;
        if !status.is_success() {
            anyhow::bail!("forecaster HTTP {status}: {text}");
        }

        serde_json::from_str::<Value>(&text)
            .with_context(|| format!("forecaster response is not valid JSON: {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(ForecastRequest {
            ticker: "AAPL",
            horizon_days: 6,
        })
        .unwrap();
        assert_eq!(body, json!({"ticker": "AAPL", "horizon_days": 6}));
    }

    #[test]
    fn url_joins_base_and_path() {
        let settings = Settings {
            forecaster_base_url: Some("http://models.local:9000/".to_string()),
            ..Default::default()
        };
        let client = HttpForecaster::from_settings(&settings).unwrap();
        assert_eq!(client.url(), "http://models.local:9000/forecast");
    }

    #[test]
    fn requires_base_url() {
        assert!(HttpForecaster::from_settings(&Settings::default()).is_err());
    }
}
