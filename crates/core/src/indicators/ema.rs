/// Span of the trend indicator plotted next to the price chart.
pub const EMA_SPAN: usize = 9;

/// Exponential moving average without bias adjustment.
///
/// bar 0  → value = price
/// bar 1+ → value = α·price + (1−α)·prev, α = 2/(span+1)
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self {
            alpha: 2.0 / (span as f64 + 1.0),
            value: None,
        }
    }

    pub fn update(&mut self, price: f64) -> f64 {
        let next = match self.value {
            None => price,
            Some(prev) => self.alpha * price + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// EMA over a whole close series; same length as the input.
pub fn ema(closes: &[f64], span: usize) -> Vec<f64> {
    let mut state = Ema::new(span);
    closes.iter().map(|c| state.update(*c)).collect()
}
