use crate::domain::error::InputError;
use crate::domain::series::HistoryWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Earliest date the date-range picker offers.
pub fn earliest_selectable_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 8, 5).unwrap_or(NaiveDate::MIN)
}

/// Raw values currently held by the input panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputValues {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub forecast_days: Option<String>,
}

impl InputValues {
    /// Normalised ticker symbol, `None` when the field is empty.
    pub fn ticker(&self) -> Option<String> {
        self.ticker
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_uppercase)
    }

    pub fn date_range_differs(&self, other: &InputValues) -> bool {
        self.start_date != other.start_date || self.end_date != other.end_date
    }

    pub fn history_window(&self, today: NaiveDate) -> HistoryWindow {
        HistoryWindow::resolve(self.start_date, self.end_date, today)
    }

    pub fn validate_dates(&self) -> Result<(), InputError> {
        let earliest = earliest_selectable_date();
        for (field, date) in [("start_date", self.start_date), ("end_date", self.end_date)] {
            if let Some(date) = date {
                if date < earliest {
                    return Err(InputError::DateBeforeEarliest {
                        field,
                        date,
                        earliest,
                    });
                }
            }
        }
        Ok(())
    }

    /// Horizon handed to the forecaster: requested days plus one.
    pub fn forecast_horizon(&self) -> Result<u32, InputError> {
        let raw = self
            .forecast_days
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(InputError::MissingHorizon)?;

        raw.parse::<u32>()
            .ok()
            .and_then(|days| days.checked_add(1))
            .ok_or_else(|| InputError::InvalidHorizon {
                raw: raw.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Submit,
    Price,
    Indicators,
    Forecast,
}

/// Per-button click counters. `None` means ARMED: not clicked since the last re-arm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounters {
    pub submit: Option<u32>,
    pub price: Option<u32>,
    pub indicators: Option<u32>,
    pub forecast: Option<u32>,
}

impl ActionCounters {
    pub fn get(&self, action: Action) -> Option<u32> {
        *self.slot(action)
    }

    pub fn is_fired(&self, action: Action) -> bool {
        self.get(action).is_some()
    }

    /// Registers one click and returns the new count.
    pub fn click(&mut self, action: Action) -> u32 {
        let counter = self.slot_mut(action);
        let next = counter.map_or(1, |n| n.saturating_add(1));
        *counter = Some(next);
        next
    }

    /// Returns every counter to ARMED.
    pub fn rearm(&mut self) {
        *self = Self::default();
    }

    fn slot(&self, action: Action) -> &Option<u32> {
        match action {
            Action::Submit => &self.submit,
            Action::Price => &self.price,
            Action::Indicators => &self.indicators,
            Action::Forecast => &self.forecast,
        }
    }

    fn slot_mut(&mut self, action: Action) -> &mut Option<u32> {
        match action {
            Action::Submit => &mut self.submit,
            Action::Price => &mut self.price,
            Action::Indicators => &mut self.indicators,
            Action::Forecast => &mut self.forecast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_days(days: &str) -> InputValues {
        InputValues {
            forecast_days: Some(days.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn ticker_is_trimmed_and_uppercased() {
        let inputs = InputValues {
            ticker: Some("  aapl ".to_string()),
            ..Default::default()
        };
        assert_eq!(inputs.ticker().as_deref(), Some("AAPL"));
    }

    #[test]
    fn blank_ticker_counts_as_empty() {
        let inputs = InputValues {
            ticker: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(inputs.ticker(), None);
        assert_eq!(InputValues::default().ticker(), None);
    }

    #[test]
    fn horizon_is_requested_days_plus_one() {
        for k in [0u32, 1, 5, 30, 4000, 100_000] {
            assert_eq!(with_days(&k.to_string()).forecast_horizon(), Ok(k + 1));
        }
        assert_eq!(with_days(" 5 ").forecast_horizon(), Ok(6));
    }

    #[test]
    fn large_horizon_is_passed_through() {
        assert_eq!(with_days("4000").forecast_horizon(), Ok(4001));
    }

    #[test]
    fn malformed_horizon_is_rejected() {
        assert_eq!(
            InputValues::default().forecast_horizon(),
            Err(InputError::MissingHorizon)
        );
        assert!(matches!(
            with_days("five").forecast_horizon(),
            Err(InputError::InvalidHorizon { .. })
        ));
        assert!(matches!(
            with_days("-3").forecast_horizon(),
            Err(InputError::InvalidHorizon { .. })
        ));
        assert!(matches!(
            with_days(&u32::MAX.to_string()).forecast_horizon(),
            Err(InputError::InvalidHorizon { .. })
        ));
    }

    #[test]
    fn dates_before_picker_minimum_are_rejected() {
        let inputs = InputValues {
            start_date: NaiveDate::from_ymd_opt(1990, 1, 1),
            ..Default::default()
        };
        assert!(matches!(
            inputs.validate_dates(),
            Err(InputError::DateBeforeEarliest {
                field: "start_date",
                ..
            })
        ));

        let ok = InputValues {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2023, 3, 1),
            ..Default::default()
        };
        assert!(ok.validate_dates().is_ok());
    }

    #[test]
    fn counters_fire_and_rearm() {
        let mut counters = ActionCounters::default();
        assert!([Action::Submit, Action::Price, Action::Indicators, Action::Forecast]
            .iter()
            .all(|a| !counters.is_fired(*a)));

        assert_eq!(counters.click(Action::Price), 1);
        assert_eq!(counters.click(Action::Price), 2);
        counters.click(Action::Forecast);
        assert_eq!(counters.get(Action::Price), Some(2));
        assert!(counters.is_fired(Action::Forecast));
        assert!(!counters.is_fired(Action::Submit));

        counters.rearm();
        assert_eq!(counters, ActionCounters::default());
    }
}
