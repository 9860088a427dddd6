use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub adj_close: Option<f64>,
    pub volume: Option<f64>,
}

/// Daily bars in strictly increasing date order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Sorts by date; on duplicate dates the later bar wins.
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match out.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => out.push(bar),
            }
        }
        Self { bars: out }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn within(mut self, window: HistoryWindow) -> Self {
        self.bars.retain(|b| window.contains(b.date));
        self
    }
}

/// Date scope of a history request. `Between` is inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryWindow {
    Full,
    Between { start: NaiveDate, end: NaiveDate },
}

impl HistoryWindow {
    /// A start date scopes the request up to `end` (or `today` when unset);
    /// without a start date the full history is requested and `end` is ignored.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        match start {
            Some(start) => Self::Between {
                start,
                end: end.unwrap_or(today),
            },
            None => Self::Full,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Self::Full => true,
            Self::Between { start, end } => *start <= date && date <= *end,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Between { start, end } if start > end)
    }
}
