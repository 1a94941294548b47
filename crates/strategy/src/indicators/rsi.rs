/// RSI (Relative Strength Index) indicator.
///
/// Average gain and average loss are simple means over a trailing window of
/// `period` price changes, so the value at index `i` uses closes `i - period ..= i`.
/// The first `period` indices are undefined (`None`).
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
}

impl Default for RsiIndicator {
    fn default() -> Self {
        Self::new(14)
    }
}

impl RsiIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period }
    }

    /// Compute RSI for every index of `closes` (oldest first).
    ///
    /// The output is aligned index-for-index with the input. A window with
    /// no losses saturates at 100.
    pub fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let mut out = vec![None; closes.len()];
        if closes.len() <= self.period {
            return out;
        }

        // changes[j] is the move into closes[j + 1]
        let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

        for (offset, window) in changes.windows(self.period).enumerate() {
            let avg_gain = window.iter().map(|c| c.max(0.0)).sum::<f64>() / self.period as f64;
            let avg_loss = window.iter().map(|c| (-c).max(0.0)).sum::<f64>() / self.period as f64;
            out[offset + self.period] = Some(rsi_from_averages(avg_gain, avg_loss));
        }
        out
    }

    /// RSI at the latest index, if defined.
    pub fn latest(&self, closes: &[f64]) -> Option<f64> {
        self.compute(closes).last().copied().flatten()
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}
