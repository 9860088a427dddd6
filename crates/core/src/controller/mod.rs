//! Update rules over session state.
//!
//! Each rule is a function of a [`RuleContext`] snapshot: the same trigger
//! values produce the same fragment. Rules never call each other; the only
//! coordination is the Profile rule re-arming the action counters.

use crate::domain::display::{Fragment, Slot};
use crate::domain::inputs::{Action, ActionCounters, InputValues};
use crate::forecast::Forecaster;
use crate::market::MarketDataClient;
use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;

pub mod charts;
pub mod dispatch;

pub use dispatch::{DispatchReport, SlotStatus, SlotUpdate};

/// Inputs a rule sees, captured when its generation token was issued.
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub inputs: InputValues,
    pub counters: ActionCounters,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Update(Fragment),
    /// Leave the slot exactly as it is.
    NoUpdate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutput {
    pub outcome: Outcome,
    /// Return every action counter to ARMED once applied.
    pub rearm: bool,
}

impl From<Outcome> for RuleOutput {
    fn from(outcome: Outcome) -> Self {
        Self {
            outcome,
            rearm: false,
        }
    }
}

/// Called with every unexpected rule failure, after it has been logged.
pub type FailureHook = Arc<dyn Fn(Slot, &anyhow::Error) + Send + Sync>;

#[derive(Clone)]
pub struct Controller {
    market: Arc<dyn MarketDataClient>,
    forecaster: Arc<dyn Forecaster>,
    on_failure: Option<FailureHook>,
}

impl Controller {
    pub fn new(market: Arc<dyn MarketDataClient>, forecaster: Arc<dyn Forecaster>) -> Self {
        Self {
            market,
            forecaster,
            on_failure: None,
        }
    }

    pub fn with_failure_hook(mut self, hook: FailureHook) -> Self {
        self.on_failure = Some(hook);
        self
    }

    pub async fn evaluate(&self, slot: Slot, ctx: &RuleContext) -> Result<RuleOutput> {
        match slot {
            Slot::Profile => self.profile_rule(ctx).await,
            Slot::Price => self.price_rule(ctx).await.map(Into::into),
            Slot::Indicators => self.indicators_rule(ctx).await.map(Into::into),
            Slot::Forecast => self.forecast_rule(ctx).await.map(Into::into),
        }
    }

    async fn profile_rule(&self, ctx: &RuleContext) -> Result<RuleOutput> {
        if !ctx.counters.is_fired(Action::Submit) {
            return Ok(Outcome::Update(Fragment::welcome()).into());
        }
        let Some(ticker) = ctx.inputs.ticker() else {
            return Ok(Outcome::NoUpdate.into());
        };

        let profile = self.market.fetch_profile(&ticker).await?;
        if profile.is_blank() {
            tracing::warn!(%ticker, provider = self.market.provider_name(), "no profile data for ticker");
        }

        Ok(RuleOutput {
            outcome: Outcome::Update(Fragment::Profile(profile)),
            rearm: true,
        })
    }

    async fn price_rule(&self, ctx: &RuleContext) -> Result<Outcome> {
        if !ctx.counters.is_fired(Action::Price) {
            return Ok(Outcome::Update(Fragment::Blank));
        }
        let Some(ticker) = ctx.inputs.ticker() else {
            return Ok(Outcome::NoUpdate);
        };
        ctx.inputs.validate_dates()?;

        let window = ctx.inputs.history_window(ctx.today);
        let series = self.market.fetch_history(&ticker, window).await?.within(window);
        tracing::debug!(%ticker, ?window, bars = series.len(), "price history fetched");

        let figure = charts::price_figure(&series).to_value()?;
        Ok(Outcome::Update(Fragment::Graph { figure }))
    }

    async fn indicators_rule(&self, ctx: &RuleContext) -> Result<Outcome> {
        if !ctx.counters.is_fired(Action::Indicators) {
            return Ok(Outcome::Update(Fragment::Blank));
        }
        // Unlike the other chart rules, an empty ticker blanks the slot.
        let Some(ticker) = ctx.inputs.ticker() else {
            return Ok(Outcome::Update(Fragment::Blank));
        };
        ctx.inputs.validate_dates()?;

        let window = ctx.inputs.history_window(ctx.today);
        let series = self.market.fetch_history(&ticker, window).await?.within(window);
        tracing::debug!(%ticker, ?window, bars = series.len(), "indicator history fetched");

        let figure = charts::indicator_figure(&series).to_value()?;
        Ok(Outcome::Update(Fragment::Graph { figure }))
    }

    async fn forecast_rule(&self, ctx: &RuleContext) -> Result<Outcome> {
        if !ctx.counters.is_fired(Action::Forecast) {
            return Ok(Outcome::Update(Fragment::Blank));
        }
        let Some(ticker) = ctx.inputs.ticker() else {
            return Ok(Outcome::NoUpdate);
        };
        let horizon_days = ctx.inputs.forecast_horizon()?;

        tracing::info!(%ticker, horizon_days, forecaster = self.forecaster.name(), "running forecast");
        let figure = self.forecaster.forecast(&ticker, horizon_days).await?;
        Ok(Outcome::Update(Fragment::Graph { figure }))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::domain::error::InputError;
    use crate::domain::series::HistoryWindow;

    fn controller(market: &Arc<FakeMarket>, forecaster: &Arc<FakeForecaster>) -> Controller {
        Controller::new(market.clone(), forecaster.clone())
    }

    fn graph(out: &RuleOutput) -> &serde_json::Value {
        match &out.outcome {
            Outcome::Update(Fragment::Graph { figure }) => figure,
            other => panic!("expected graph, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn profile_welcomes_before_first_submit() {
        let market = Arc::new(FakeMarket::apple());
        let c = controller(&market, &Arc::default());

        let out = c.evaluate(Slot::Profile, &ctx(ticker("AAPL"), &[])).await.unwrap();
        assert_eq!(out.outcome, Outcome::Update(Fragment::welcome()));
        assert!(!out.rearm);
        assert!(market.profile_calls().is_empty());
    }

    #[tokio::test]
    async fn profile_without_ticker_does_not_update() {
        let market = Arc::new(FakeMarket::apple());
        let c = controller(&market, &Arc::default());

        let out = c
            .evaluate(Slot::Profile, &ctx(InputValues::default(), &[Action::Submit]))
            .await
            .unwrap();
        assert_eq!(out.outcome, Outcome::NoUpdate);
        assert!(!out.rearm);
    }

    #[tokio::test]
    async fn profile_fetches_and_rearms() {
        let market = Arc::new(FakeMarket::apple());
        let c = controller(&market, &Arc::default());

        let out = c
            .evaluate(Slot::Profile, &ctx(ticker(" aapl"), &[Action::Submit]))
            .await
            .unwrap();
        assert!(out.rearm);
        match out.outcome {
            Outcome::Update(Fragment::Profile(p)) => {
                assert_eq!(p.short_name, "Apple Inc.");
                assert!(!p.description.is_empty());
                assert!(!p.logo_url.is_empty());
            }
            other => panic!("expected profile, got {other:?}"),
        }
        assert_eq!(market.profile_calls(), vec!["AAPL".to_string()]);
    }

    #[tokio::test]
    async fn chart_rules_blank_until_clicked() {
        let market = Arc::new(FakeMarket::apple());
        let c = controller(&market, &Arc::default());

        for slot in [Slot::Price, Slot::Indicators, Slot::Forecast] {
            let out = c.evaluate(slot, &ctx(ticker("AAPL"), &[])).await.unwrap();
            assert_eq!(out.outcome, Outcome::Update(Fragment::Blank), "{slot:?}");
        }
        assert!(market.history_calls().is_empty());
    }

    #[tokio::test]
    async fn empty_ticker_leaves_price_and_forecast_alone() {
        let market = Arc::new(FakeMarket::apple());
        let forecaster = Arc::new(FakeForecaster::default());
        let c = controller(&market, &forecaster);
        let fired = [Action::Price, Action::Indicators, Action::Forecast];

        let price = c
            .evaluate(Slot::Price, &ctx(ticker("  "), &fired))
            .await
            .unwrap();
        assert_eq!(price.outcome, Outcome::NoUpdate);

        let forecast = c
            .evaluate(Slot::Forecast, &ctx(ticker(""), &fired))
            .await
            .unwrap();
        assert_eq!(forecast.outcome, Outcome::NoUpdate);

        let indicators = c
            .evaluate(Slot::Indicators, &ctx(InputValues::default(), &fired))
            .await
            .unwrap();
        assert_eq!(indicators.outcome, Outcome::Update(Fragment::Blank));

        assert!(market.history_calls().is_empty());
        assert!(forecaster.calls().is_empty());
    }

    #[tokio::test]
    async fn price_without_range_requests_full_history() {
        let market = Arc::new(FakeMarket::apple());
        let c = controller(&market, &Arc::default());

        let out = c
            .evaluate(Slot::Price, &ctx(ticker("AAPL"), &[Action::Price]))
            .await
            .unwrap();
        let figure = graph(&out);
        assert_eq!(figure["data"][0]["name"], "Close");
        assert_eq!(figure["data"][1]["name"], "Open");
        assert_eq!(figure["data"][0]["y"].as_array().unwrap().len(), 90);
        assert_eq!(
            market.history_calls(),
            vec![("AAPL".to_string(), HistoryWindow::Full)]
        );
    }

    #[tokio::test]
    async fn indicators_are_scoped_to_date_range() {
        let market = Arc::new(FakeMarket::apple());
        let c = controller(&market, &Arc::default());
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        let inputs = InputValues {
            start_date: Some(start),
            end_date: Some(end),
            ..ticker("AAPL")
        };

        let out = c
            .evaluate(Slot::Indicators, &ctx(inputs, &[Action::Indicators]))
            .await
            .unwrap();
        let figure = graph(&out);
        let xs = figure["data"][0]["x"].as_array().unwrap();
        // Jan (31) + Feb (28) + Mar 1
        assert_eq!(xs.len(), 60);
        assert_eq!(xs.first().unwrap(), "2023-01-01");
        assert_eq!(xs.last().unwrap(), "2023-03-01");
        assert_eq!(figure["data"][0]["name"], "EMA_9");
        assert_eq!(figure["data"][0]["mode"], "lines+markers");
        assert_eq!(
            market.history_calls(),
            vec![("AAPL".to_string(), HistoryWindow::Between { start, end })]
        );
    }

    #[tokio::test]
    async fn forecast_passes_days_plus_one() {
        let market = Arc::new(FakeMarket::apple());
        let forecaster = Arc::new(FakeForecaster::default());
        let c = controller(&market, &forecaster);
        let inputs = InputValues {
            forecast_days: Some("5".to_string()),
            ..ticker("AAPL")
        };

        let out = c
            .evaluate(Slot::Forecast, &ctx(inputs, &[Action::Forecast]))
            .await
            .unwrap();
        assert_eq!(graph(&out)["layout"]["title"]["text"], "AAPL +6");
        assert_eq!(forecaster.calls(), vec![("AAPL".to_string(), 6)]);
    }

    #[tokio::test]
    async fn non_numeric_horizon_aborts() {
        let market = Arc::new(FakeMarket::apple());
        let forecaster = Arc::new(FakeForecaster::default());
        let c = controller(&market, &forecaster);
        let inputs = InputValues {
            forecast_days: Some("soon".to_string()),
            ..ticker("AAPL")
        };

        let err = c
            .evaluate(Slot::Forecast, &ctx(inputs, &[Action::Forecast]))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InputError>(),
            Some(InputError::InvalidHorizon { .. })
        ));
        assert!(forecaster.calls().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_is_an_error() {
        let market = Arc::new(FakeMarket {
            fail: true,
            ..FakeMarket::apple()
        });
        let c = controller(&market, &Arc::default());

        let res = c
            .evaluate(Slot::Price, &ctx(ticker("AAPL"), &[Action::Price]))
            .await;
        assert!(res.is_err());
    }
}
