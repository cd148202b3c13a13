//! Plain `f64` helpers behind the series statistics.
//!
//! Both return `None` rather than a value that could not be shown: empty
//! input, or a result that overflowed to infinity.

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation around a precomputed `mean`.
pub fn stddev(values: &[f64], mean: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    finite((squares / values.len() as f64).sqrt())
}
