//! Simple moving average and moving sample standard deviation.
//!
//! SMA(n) = sum(C[i-j] for j in 0..n) / n
//! STDDEV(n) = sqrt(sum((C[i-j] - SMA(n))^2 for j in 0..n) / (n - 1))
//!
//! The standard deviation is the *sample* statistic (divides by n-1). For a
//! single-point window it is defined as 0.

/// Mean of the last `period` values, or `None` if there are fewer.
pub fn calculate_sma(values: &[f64], period: usize) -> Option<f64> {
    let window = trailing(values, period)?;
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Sample standard deviation of the last `period` values around `mean`.
pub fn calculate_stddev(values: &[f64], period: usize, mean: f64) -> Option<f64> {
    let window = trailing(values, period)?;
    if period == 1 {
        return Some(0.0);
    }

    let variance: f64 = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (period - 1) as f64;

    Some(variance.sqrt())
}

fn trailing(values: &[f64], period: usize) -> Option<&[f64]> {
    if period == 0 || values.len() < period {
        return None;
    }
    Some(&values[values.len() - period..])
}
