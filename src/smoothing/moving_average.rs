use ndarray::{s, Array1, ArrayView1};

use crate::error::SeriesError;

/// Boundary-aware moving average of a series with missing samples.
///
/// A `NaN` sample stays `NaN`. Any other sample is replaced by the mean of
/// the finite values in `data[start..end]`, where `start = i - window / 2`.
/// Near the beginning of the series (`start` clamped to 0) the window becomes
/// `0..2i` so it stays centred on `i`; elsewhere it spans `window` samples,
/// stopping short of the last sample. A window of 1 leaves the series as is.
pub fn moving_average(data: &Array1<f64>, window: usize) -> Result<Array1<f64>, SeriesError> {
    if window == 0 {
        return Err(SeriesError::InvalidWindow(window));
    }
    if window == 1 {
        return Ok(data.clone());
    }

    let len = data.len();
    let half = window / 2;
    let mut out = Vec::with_capacity(len);

    for (i, &value) in data.iter().enumerate() {
        if value.is_nan() {
            out.push(f64::NAN);
            continue;
        }

        let start = i.saturating_sub(half);
        let end = if start == 0 {
            (i * 2).max(1)
        } else {
            (start + window).min(len - 1)
        };
        out.push(finite_mean(data.slice(s![start..end.min(len)])));
    }

    Ok(Array1::from(out))
}

/// Mean of the finite values, `NaN` if there are none.
fn finite_mean(values: ArrayView1<f64>) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
