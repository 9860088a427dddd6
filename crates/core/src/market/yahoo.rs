use crate::config::{env_or, Settings};
use crate::domain::profile::CompanyProfile;
use crate::domain::series::{HistoryWindow, PriceBar, PriceSeries};
use crate::market::types::{ChartEnvelope, QuoteSummaryEnvelope};
use crate::market::MarketDataClient;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
// One attempt: the dashboard never retried upstream calls.
const DEFAULT_RETRIES: u32 = 1;
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";
/// Answers 404 but hands out the session cookie quoteSummary insists on.
const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
const LOGO_BASE_URL: &str = "https://logo.clearbit.com/";
const PROFILE_MODULES: &str = "assetProfile,price";

#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    http: reqwest::Client,
    base_url: String,
    cookie_url: String,
    retries: u32,
    crumb: Arc<Mutex<Option<String>>>,
}

/// The upstream refused the session cookie or crumb.
#[derive(Debug)]
struct CrumbRejected {
    status: StatusCode,
    body: String,
}

impl fmt::Display for CrumbRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "market data HTTP {}: {}", self.status, self.body)
    }
}

impl std::error::Error for CrumbRejected {}

impl YahooFinanceClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout_secs = env_or("MARKET_DATA_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        let retries = env_or("MARKET_DATA_RETRIES", DEFAULT_RETRIES);
        let cookie_url: String = env_or("MARKET_DATA_COOKIE_URL", DEFAULT_COOKIE_URL.to_string());
        Ok(Self::new(
            settings.market_data_base_url(),
            Duration::from_secs(timeout_secs),
            retries,
        )?
        .with_cookie_url(cookie_url))
    }

    pub fn new(base_url: &str, timeout: Duration, retries: u32) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            retries: retries.max(1),
            crumb: Arc::new(Mutex::new(None)),
        })
    }

    pub fn with_cookie_url(mut self, cookie_url: impl Into<String>) -> Self {
        self.cookie_url = cookie_url.into();
        self
    }

    fn url(&self, path: &str, ticker: &str) -> String {
        format!("{}/{}/{}", self.base_url, path, ticker)
    }

    /// `Ok(None)` when the upstream does not know the ticker.
    async fn fetch_once(&self, url: &str, query: &[(&str, String)]) -> Result<Option<Value>> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let text = res
            .text()
            .await
            .context("failed to read market data response")?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CrumbRejected { status, body: text }.into());
        }
        if !status.is_success() {
            anyhow::bail!("market data HTTP {status}: {text}");
        }

        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("market data response is not valid JSON: {text}"))?;
        Ok(Some(raw_json))
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Option<Value>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(url, query).await {
                Ok(v) => return Ok(v),
                Err(err) => {
                    if attempt >= self.retries || err.is::<CrumbRejected>() {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, %url, error = %err, "market data fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Session crumb for quoteSummary, fetched once and shared by clones.
    async fn crumb(&self) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the cookie matters here; the status is usually 404.
        self.http
            .get(&self.cookie_url)
            .send()
            .await
            .context("failed to obtain market data session cookie")?;

        let res = self
            .http
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await
            .context("market data crumb request failed")?;
        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data crumb")?;

        let crumb = text.trim();
        if !status.is_success()
            || crumb.is_empty()
            || crumb.contains(char::is_whitespace)
            || crumb.contains('<')
        {
            anyhow::bail!("market data crumb HTTP {status}: {text}");
        }

        tracing::debug!("obtained market data crumb");
        *cached = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    async fn forget_crumb(&self, stale: &str) {
        let mut cached = self.crumb.lock().await;
        if cached.as_deref() == Some(stale) {
            *cached = None;
        }
    }
}

#[async_trait::async_trait]
impl MarketDataClient for YahooFinanceClient {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile> {
        let url = self.url("v10/finance/quoteSummary", ticker);

        let crumb = self.crumb().await?;
        let raw = match self.get_json(&url, &summary_query(&crumb)).await {
            Err(err) if err.is::<CrumbRejected>() => {
                tracing::info!(%ticker, error = %err, "crumb rejected; starting a new session");
                self.forget_crumb(&crumb).await;
                let crumb = self.crumb().await?;
                self.get_json(&url, &summary_query(&crumb)).await?
            }
            other => other?,
        };

        let Some(raw) = raw else {
            tracing::warn!(%ticker, "profile lookup returned not found");
            return Ok(CompanyProfile::default());
        };

        let envelope = serde_json::from_value::<QuoteSummaryEnvelope>(raw)
            .context("failed to parse quoteSummary response")?;
        Ok(profile_from_summary(envelope))
    }

    async fn fetch_history(&self, ticker: &str, window: HistoryWindow) -> Result<PriceSeries> {
        if window.is_empty() {
            return Ok(PriceSeries::default());
        }

        let url = self.url("v8/finance/chart", ticker);
        let Some(raw) = self.get_json(&url, &history_query(window)).await? else {
            tracing::warn!(%ticker, "history lookup returned not found");
            return Ok(PriceSeries::default());
        };

        let envelope = serde_json::from_value::<ChartEnvelope>(raw)
            .context("failed to parse chart response")?;
        Ok(series_from_chart(envelope).within(window))
    }
}

fn summary_query(crumb: &str) -> [(&'static str, String); 2] {
    [
        ("modules", PROFILE_MODULES.to_string()),
        ("crumb", crumb.to_string()),
    ]
}

fn history_query(window: HistoryWindow) -> Vec<(&'static str, String)> {
    let mut query = vec![("interval", "1d".to_string())];
    match window {
        HistoryWindow::Full => query.push(("range", "max".to_string())),
        HistoryWindow::Between { start, end } => {
            // period2 is exclusive upstream; ask for the day after `end`.
            let after_end = end.succ_opt().unwrap_or(end);
            query.push(("period1", unix_midnight(start).to_string()));
            query.push(("period2", unix_midnight(after_end).to_string()));
        }
    }
    query
}

fn unix_midnight(date: NaiveDate) -> i64 {
    NaiveDateTime::new(date, NaiveTime::default())
        .and_utc()
        .timestamp()
}

fn series_from_chart(envelope: ChartEnvelope) -> PriceSeries {
    if let Some(err) = envelope.chart.error.as_ref() {
        if !err.is_not_found() {
            tracing::warn!(code = %err.code, description = ?err.description, "chart endpoint reported an error");
        }
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return PriceSeries::default();
    };

    let Some(quote) = result.indicators.quote.first() else {
        return PriceSeries::default();
    };
    let adjclose = result
        .indicators
        .adjclose
        .first()
        .map(|c| c.adjclose.as_slice())
        .unwrap_or(&[]);
    let offset = result.meta.gmt_offset;

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(close)) = (col(&quote.open, i), col(&quote.close, i)) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        bars.push(PriceBar {
            date,
            open,
            high: col(&quote.high, i),
            low: col(&quote.low, i),
            close,
            adj_close: col(adjclose, i),
            volume: col(&quote.volume, i),
        });
    }

    PriceSeries::new(bars)
}

fn col(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

fn profile_from_summary(envelope: QuoteSummaryEnvelope) -> CompanyProfile {
    let Some(result) = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
    else {
        return CompanyProfile::default();
    };

    let asset = result.asset_profile.unwrap_or_default();
    let description = asset.long_business_summary.unwrap_or_default();
    let logo_url = asset
        .website
        .as_deref()
        .map(logo_url_for_website)
        .unwrap_or_default();
    let short_name = result
        .price
        .and_then(|p| p.short_name)
        .unwrap_or_default();

    CompanyProfile {
        description: description.trim().to_string(),
        logo_url,
        short_name: short_name.trim().to_string(),
    }
}

/// Logo service URL for the bare domain of a company website.
fn logo_url_for_website(website: &str) -> String {
    let website = website.trim();
    if website.is_empty() {
        return String::new();
    }

    let with_scheme = if website.contains("://") {
        website.to_string()
    } else {
        format!("https://{website}")
    };

    let Ok(url) = reqwest::Url::parse(&with_scheme) else {
        return String::new();
    };
    let Some(host) = url.host_str() else {
        return String::new();
    };

    let domain = host.strip_prefix("www.").unwrap_or(host);
    format!("{LOGO_BASE_URL}{domain}")
}
