pub mod controller;
pub mod domain;
pub mod forecast;
pub mod indicators;
pub mod market;
pub mod session;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://query2.finance.yahoo.com";

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub market_data_base_url: Option<String>,
        pub forecaster_base_url: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                market_data_base_url: non_empty_var("MARKET_DATA_BASE_URL"),
                forecaster_base_url: non_empty_var("FORECASTER_BASE_URL"),
            })
        }

        pub fn market_data_base_url(&self) -> &str {
            self.market_data_base_url
                .as_deref()
                .unwrap_or(DEFAULT_MARKET_DATA_BASE_URL)
        }

        pub fn require_forecaster_base_url(&self) -> anyhow::Result<&str> {
            self.forecaster_base_url
                .as_deref()
                .context("FORECASTER_BASE_URL is required")
        }
    }

    /// Reads a numeric knob from the environment, falling back when unset or unparsable.
    pub fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
        std::env::var(key)
            .ok()
            .and_then(|s| s.trim().parse::<T>().ok())
            .unwrap_or(default)
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
