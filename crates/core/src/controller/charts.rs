use crate::domain::figure::{Figure, TraceMode};
use crate::domain::series::PriceSeries;
use crate::indicators::{ema, EMA_SPAN};

pub const PRICE_CHART_TITLE: &str = "Closing and Opening Price vs Date";
pub const INDICATOR_CHART_TITLE: &str = "Exponential Moving Average vs Date";
pub const EMA_TRACE_NAME: &str = "EMA_9";

/// Close and Open against Date on one time axis.
pub fn price_figure(series: &PriceSeries) -> Figure {
    let dates = series.dates();
    Figure::new(PRICE_CHART_TITLE, "Date", "value")
        .with_trace("Close", TraceMode::Lines, dates.clone(), series.closes())
        .with_trace("Open", TraceMode::Lines, dates, series.opens())
}

/// EMA_9 of Close against Date, points connected and marked.
pub fn indicator_figure(series: &PriceSeries) -> Figure {
    Figure::new(INDICATOR_CHART_TITLE, "Date", EMA_TRACE_NAME).with_trace(
        EMA_TRACE_NAME,
        TraceMode::LinesMarkers,
        series.dates(),
        ema(&series.closes(), EMA_SPAN),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::PriceBar;
    use chrono::NaiveDate;

    fn sample() -> PriceSeries {
        let bars = [(3, 10.0, 11.0), (4, 20.0, 19.0), (5, 15.0, 16.0)]
            .into_iter()
            .map(|(day, close, open)| PriceBar {
                date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
                open,
                high: None,
                low: None,
                close,
                adj_close: None,
                volume: None,
            })
            .collect();
        PriceSeries::new(bars)
    }

    #[test]
    fn price_figure_has_close_then_open() {
        let fig = price_figure(&sample());
        assert_eq!(fig.layout.title.text, PRICE_CHART_TITLE);
        let names: Vec<_> = fig.data.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Close", "Open"]);
        assert_eq!(fig.data[0].y, vec![10.0, 20.0, 15.0]);
        assert_eq!(fig.data[1].y, vec![11.0, 19.0, 16.0]);
        assert_eq!(fig.data[0].x, fig.data[1].x);
    }

    #[test]
    fn indicator_figure_plots_ema() {
        let fig = indicator_figure(&sample());
        assert_eq!(fig.data.len(), 1);
        let trace = &fig.data[0];
        assert_eq!(trace.name, EMA_TRACE_NAME);
        assert_eq!(trace.mode, TraceMode::LinesMarkers);
        assert_eq!(trace.y[0], 10.0);
        assert!((trace.y[1] - 12.0).abs() < 1e-12);
        assert!((trace.y[2] - 12.6).abs() < 1e-12);
    }
}
