use crate::config::env_or;
use crate::domain::figure::{Figure, TraceMode};
use crate::domain::series::{HistoryWindow, PriceSeries};
use crate::forecast::Forecaster;
use crate::market::MarketDataClient;
use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_LOOKBACK_DAYS: i64 = 60;

/// Longest projection the linear model will draw.
pub const MAX_PREDICTED_DAYS: u32 = 3650;

/// Least-squares linear trend over recent closes, projected forward one
/// calendar day at a time.
pub struct TrendForecaster {
    market: Arc<dyn MarketDataClient>,
    lookback_days: i64,
}

impl TrendForecaster {
    pub fn new(market: Arc<dyn MarketDataClient>, lookback_days: i64) -> Self {
        Self {
            market,
            lookback_days: lookback_days.max(1),
        }
    }

    pub fn from_env(market: Arc<dyn MarketDataClient>) -> Self {
        Self::new(market, env_or("FORECAST_LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS))
    }
}

#[async_trait::async_trait]
impl Forecaster for TrendForecaster {
    fn name(&self) -> &'static str {
        "linear_trend"
    }

    async fn forecast(&self, ticker: &str, horizon_days: u32) -> Result<Value> {
        anyhow::ensure!(
            horizon_days.saturating_sub(1) <= MAX_PREDICTED_DAYS,
            "trend model projects at most {MAX_PREDICTED_DAYS} days (asked for {})",
            horizon_days.saturating_sub(1)
        );
        let today = Utc::now().date_naive();
        let window = HistoryWindow::Between {
            start: today - Duration::days(self.lookback_days),
            end: today,
        };
        let history = self.market.fetch_history(ticker, window).await?;
        tracing::debug!(%ticker, horizon_days, points = history.len(), "fitting trend");

        trend_figure(&history, horizon_days, today).to_value()
    }
}

/// Historical closes plus `horizon_days - 1` predicted closes after `today`.
pub fn trend_figure(history: &PriceSeries, horizon_days: u32, today: NaiveDate) -> Figure {
    let shown_days = horizon_days.saturating_sub(1);
    let title = format!("Predicted Close Price of next {shown_days} days");
    let figure = Figure::new(title, "Date", "Close Price").with_trace(
        "Close",
        TraceMode::Lines,
        history.dates(),
        history.closes(),
    );

    let Some(origin) = history.bars().first().map(|b| b.date) else {
        return figure;
    };
    let xs: Vec<f64> = history
        .dates()
        .iter()
        .map(|d| (*d - origin).num_days() as f64)
        .collect();
    let Some(line) = fit_line(&xs, &history.closes()) else {
        return figure;
    };

    let future: Vec<NaiveDate> = (1..=i64::from(shown_days))
        .map(|i| today + Duration::days(i))
        .collect();
    let predicted = future
        .iter()
        .map(|d| line.at((*d - origin).num_days() as f64))
        .collect();

    figure.with_trace("Predicted", TraceMode::LinesMarkers, future, predicted)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Line {
    slope: f64,
    intercept: f64,
}

impl Line {
    fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

fn fit_line(xs: &[f64], ys: &[f64]) -> Option<Line> {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return None;
    }
    let nf = n as f64;
    let mean_x = xs[..n].iter().sum::<f64>() / nf;
    let mean_y = ys[..n].iter().sum::<f64>() / nf;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x) * (x - mean_x);
    }

    // Flat line through the mean when x has no spread.
    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    Some(Line {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}
