//! Momentum helpers shared by training-time and inference-time features

/// Slope of an ordinary least-squares line through the last `window` values.
///
/// Points are indexed `0..n`. Returns 0.0 when fewer than two values are
/// available.
pub fn trend(values: &[f64], window: usize) -> f64 {
    let recent = &values[values.len().saturating_sub(window)..];
    if recent.len() < 2 {
        return 0.0;
    }

    let n = recent.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = recent.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (i, y) in recent.iter().enumerate() {
        let dx = i as f64 - x_mean;
        covariance += dx * (y - y_mean);
        variance += dx * dx;
    }

    covariance / variance
}

/// Rounds elapsed since the cumulative win count last increased.
///
/// `wins` holds cumulative win totals per round. With fewer than two entries,
/// or no increase between the first and last entry, the whole length is
/// returned. Only wins inside the supplied slice are visible, so pass the
/// driver's full history.
pub fn races_since_last_win(wins: &[u32]) -> usize {
    let n = wins.len();
    if n < 2 || wins[n - 1] == wins[0] {
        return n;
    }

    (1..n)
        .rev()
        .find(|&i| wins[i] > wins[i - 1])
        .map(|i| n - 1 - i)
        .unwrap_or(n)
}
