/// Exponential moving average over the whole series (oldest first).
///
/// Smoothing factor `α = 2 / (span + 1)`. The first output equals the first
/// input; there is no SMA seeding delay, so every index is defined.
/// Returns an empty `Vec` for an empty input.
pub fn ema(series: &[f64], span: usize) -> Vec<f64> {
    assert!(span >= 1, "EMA span must be >= 1");
    let alpha = 2.0 / (span as f64 + 1.0);

    let mut out = Vec::with_capacity(series.len());
    let mut prev: Option<f64> = None;
    for &value in series {
        let next = match prev {
            None => value,
            Some(p) => alpha * value + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}
