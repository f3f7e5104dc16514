//! Data selection for the metric-vs-metric comparison view.

use std::ops::RangeInclusive;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::FormulaError;
use crate::formula::{evaluate_formula, SeriesLookup, SymbolTable, TimeIndexBase};
use crate::series::{slice_range, SeriesSet};
use crate::smoothing::SmoothedSeriesCache;

/// Which copy of the data the view is currently plotting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Raw,
    #[default]
    Smoothed,
}

/// Raw or smoothed series, picked by [`DisplayMode`].
pub struct SeriesView<'a> {
    raw: &'a SeriesSet,
    smoothed: &'a SmoothedSeriesCache,
    mode: DisplayMode,
}

impl<'a> SeriesView<'a> {
    pub fn new(raw: &'a SeriesSet, smoothed: &'a SmoothedSeriesCache, mode: DisplayMode) -> Self {
        SeriesView {
            raw,
            smoothed,
            mode,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }
}

impl SeriesLookup for SeriesView<'_> {
    fn series(&self, name: &str) -> Option<&Array1<f64>> {
        match self.mode {
            DisplayMode::Raw => self.raw.get(name),
            DisplayMode::Smoothed => self.smoothed.get(name),
        }
    }
}

/// What goes on one axis of the comparison plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AxisSource {
    Series(String),
    TimeIndex,
    Formula(String),
}

/// Resolves axis selections against a view, restricted to a date window.
pub struct Comparison<'a> {
    pub view: SeriesView<'a>,
    pub symbols: &'a SymbolTable,
    pub time_index: Array1<f64>,
}

impl<'a> Comparison<'a> {
    pub fn new(view: SeriesView<'a>, symbols: &'a SymbolTable, base: TimeIndexBase) -> Self {
        let time_index = view.raw.time_index(base);
        Comparison {
            view,
            symbols,
            time_index,
        }
    }

    pub fn axis_data(
        &self,
        source: &AxisSource,
        range: &RangeInclusive<usize>,
    ) -> Result<Array1<f64>, FormulaError> {
        let full = match source {
            AxisSource::TimeIndex => self.time_index.clone(),
            AxisSource::Series(name) => self
                .view
                .series(name)
                .cloned()
                .ok_or_else(|| FormulaError::MissingSeries { name: name.clone() })?,
            AxisSource::Formula(formula) => {
                evaluate_formula(formula, self.symbols, &self.view, &self.time_index)?
            }
        };
        Ok(slice_range(&full, range))
    }

    /// `(x, y)` pair ready for plotting.
    pub fn scatter(
        &self,
        x: &AxisSource,
        y: &AxisSource,
        range: &RangeInclusive<usize>,
    ) -> Result<(Array1<f64>, Array1<f64>), FormulaError> {
        Ok((self.axis_data(x, range)?, self.axis_data(y, range)?))
    }
}
