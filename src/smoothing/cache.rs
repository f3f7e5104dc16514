use std::collections::BTreeMap;

use ndarray::Array1;
use tracing::debug;

use super::moving_average::moving_average;
use crate::error::SeriesError;
use crate::formula::SeriesLookup;
use crate::series::SeriesSet;

/// Smoothed copy of every metric in a [`SeriesSet`] for one window size.
///
/// Owned by whoever drives the views; rebuilt when the window changes or the
/// underlying series are replaced.
#[derive(Debug, Clone)]
pub struct SmoothedSeriesCache {
    window: usize,
    smoothed: BTreeMap<String, Array1<f64>>,
}

impl SmoothedSeriesCache {
    pub fn new(series: &SeriesSet, window: usize) -> Result<Self, SeriesError> {
        let mut cache = SmoothedSeriesCache {
            window,
            smoothed: BTreeMap::new(),
        };
        cache.refresh(series)?;
        Ok(cache)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Change the window. Returns `true` if the cache had to be rebuilt.
    ///
    /// On error the previous window and contents are kept.
    pub fn set_window(&mut self, series: &SeriesSet, window: usize) -> Result<bool, SeriesError> {
        if window == self.window {
            return Ok(false);
        }
        let smoothed = smooth_all(series, window)?;
        debug!(old = self.window, new = window, "moving average window changed");
        self.window = window;
        self.smoothed = smoothed;
        Ok(true)
    }

    /// Recompute everything for the current window, e.g. after a series was replaced.
    pub fn refresh(&mut self, series: &SeriesSet) -> Result<(), SeriesError> {
        self.smoothed = smooth_all(series, self.window)?;
        Ok(())
    }

    /// Recompute a single series after it was replaced in `series`.
    pub fn refresh_one(&mut self, series: &SeriesSet, name: &str) -> Result<(), SeriesError> {
        let values = series
            .get(name)
            .ok_or_else(|| SeriesError::UnknownSeries(name.to_string()))?;
        let smoothed = moving_average(values, self.window)?;
        debug!(series = name, window = self.window, "refreshed smoothed series");
        self.smoothed.insert(name.to_string(), smoothed);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Array1<f64>> {
        self.smoothed.get(name)
    }

    pub fn len(&self) -> usize {
        self.smoothed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.smoothed.is_empty()
    }
}

impl SeriesLookup for SmoothedSeriesCache {
    fn series(&self, name: &str) -> Option<&Array1<f64>> {
        self.get(name)
    }
}

fn smooth_all(
    series: &SeriesSet,
    window: usize,
) -> Result<BTreeMap<String, Array1<f64>>, SeriesError> {
    if window == 0 {
        return Err(SeriesError::InvalidWindow(window));
    }
    let smoothed = series
        .metrics()
        .map(|(label, values)| Ok((label.to_string(), moving_average(values, window)?)))
        .collect::<Result<BTreeMap<_, _>, SeriesError>>()?;
    debug!(window, series = smoothed.len(), "recomputed moving averages");
    Ok(smoothed)
}
