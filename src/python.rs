use std::collections::HashMap;
use std::fmt::Display;

use ndarray::Array1;
use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::comparison::{AxisSource, Comparison, DisplayMode, SeriesView};
use crate::formula::{evaluate_formula, SymbolTable};
use crate::series::SeriesSet;
use crate::settings::Settings;
use crate::smoothing::{self, SmoothedSeriesCache};

fn to_py_error(e: impl Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn to_owned_map(data: HashMap<String, PyReadonlyArray1<f64>>) -> HashMap<String, Array1<f64>> {
    data.into_iter()
        .map(|(name, values)| (name, values.as_array().to_owned()))
        .collect()
}

/// Moving average of one series; `NaN` marks missing samples.
#[pyfunction]
pub fn moving_average<'py>(
    py: Python<'py>,
    data: PyReadonlyArray1<f64>,
    window: usize,
) -> PyResult<&'py PyArray1<f64>> {
    let values = data.as_array().to_owned();
    let smoothed = smoothing::moving_average(&values, window).map_err(to_py_error)?;
    Ok(PyArray1::from_owned_array(py, smoothed))
}

/// Evaluate `formula` with an explicit `{symbol: series name}` mapping.
///
/// A symbol whose series name is not in `data` stands for `days`.
#[pyfunction]
pub fn evaluate<'py>(
    py: Python<'py>,
    formula: &str,
    symbols: HashMap<char, String>,
    data: HashMap<String, PyReadonlyArray1<f64>>,
    days: PyReadonlyArray1<f64>,
) -> PyResult<&'py PyArray1<f64>> {
    let data = to_owned_map(data);
    let table = SymbolTable::from_named_pairs(symbols, |name| data.contains_key(name));

    let days = days.as_array().to_owned();
    let result = evaluate_formula(formula, &table, &data, &days).map_err(to_py_error)?;
    Ok(PyArray1::from_owned_array(py, result))
}

#[pyclass]
pub struct FormulaEvaluator {
    symbols: SymbolTable,
}

#[pymethods]
impl FormulaEvaluator {
    #[new]
    #[pyo3(signature = (labels, time_label = "Days"))]
    fn new(labels: Vec<String>, time_label: &str) -> PyResult<Self> {
        let symbols = SymbolTable::from_labels(&labels, time_label).map_err(to_py_error)?;
        Ok(FormulaEvaluator { symbols })
    }

    fn legend(&self) -> String {
        self.symbols.legend()
    }

    fn symbols(&self) -> Vec<(char, String)> {
        self.symbols
            .iter()
            .map(|(symbol, binding)| (*symbol, self.symbols.label_of(binding).to_string()))
            .collect()
    }

    fn evaluate<'py>(
        &self,
        py: Python<'py>,
        formula: &str,
        data: HashMap<String, PyReadonlyArray1<f64>>,
        days: PyReadonlyArray1<f64>,
    ) -> PyResult<&'py PyArray1<f64>> {
        let data = to_owned_map(data);
        let days = days.as_array().to_owned();
        let result = evaluate_formula(formula, &self.symbols, &data, &days).map_err(to_py_error)?;
        Ok(PyArray1::from_owned_array(py, result))
    }
}

/// A loaded log together with its smoothed copies and formula symbols.
#[pyclass]
pub struct BodyLog {
    settings: Settings,
    series: SeriesSet,
    cache: SmoothedSeriesCache,
    symbols: SymbolTable,
}

impl BodyLog {
    fn axis_source(&self, selection: &str) -> AxisSource {
        if self.series.get(selection).is_some() {
            AxisSource::Series(selection.to_string())
        } else if selection == self.settings.time_index_label {
            AxisSource::TimeIndex
        } else {
            AxisSource::Formula(selection.to_string())
        }
    }

    fn mode(smoothed: Option<bool>, default: DisplayMode) -> DisplayMode {
        match smoothed {
            Some(true) => DisplayMode::Smoothed,
            Some(false) => DisplayMode::Raw,
            None => default,
        }
    }
}

#[pymethods]
impl BodyLog {
    /// `document` is the canonical JSON column layout, `settings` an optional
    /// JSON settings document.
    #[new]
    #[pyo3(signature = (document, settings = None))]
    fn new(document: &str, settings: Option<&str>) -> PyResult<Self> {
        let settings = match settings {
            Some(json) => Settings::from_json_str(json).map_err(to_py_error)?,
            None => Settings::default(),
        };
        let series = SeriesSet::from_json_str(document).map_err(to_py_error)?;
        let cache = SmoothedSeriesCache::new(&series, settings.moving_average_window)
            .map_err(to_py_error)?;
        let symbols = SymbolTable::from_labels(&series.labels(), &settings.time_index_label)
            .map_err(to_py_error)?;
        Ok(BodyLog {
            settings,
            series,
            cache,
            symbols,
        })
    }

    fn __len__(&self) -> usize {
        self.series.len()
    }

    fn labels(&self) -> Vec<String> {
        self.series.labels().into_iter().map(String::from).collect()
    }

    fn dates(&self) -> Vec<String> {
        self.series.dates().to_vec()
    }

    fn legend(&self) -> String {
        self.symbols.legend()
    }

    fn window(&self) -> usize {
        self.cache.window()
    }

    fn set_window(&mut self, window: usize) -> PyResult<bool> {
        let changed = self.cache.set_window(&self.series, window).map_err(to_py_error)?;
        self.settings.moving_average_window = window;
        Ok(changed)
    }

    #[pyo3(signature = (name, smoothed = false))]
    fn get<'py>(
        &self,
        py: Python<'py>,
        name: &str,
        smoothed: bool,
    ) -> PyResult<&'py PyArray1<f64>> {
        let values = if smoothed {
            self.cache.get(name)
        } else {
            self.series.get(name)
        };
        let values =
            values.ok_or_else(|| PyValueError::new_err(format!("no series named '{name}'")))?;
        Ok(PyArray1::from_owned_array(py, values.clone()))
    }

    fn replace(&mut self, name: &str, values: PyReadonlyArray1<f64>) -> PyResult<()> {
        self.series
            .replace(name, values.as_array().to_owned())
            .map_err(to_py_error)?;
        self.cache.refresh_one(&self.series, name).map_err(to_py_error)
    }

    fn readout(&self, index: usize) -> Option<String> {
        self.series
            .readout(index, &self.cache)
            .map(|readout| readout.to_string())
    }

    fn year_markers(&self) -> Vec<(usize, String)> {
        self.series.year_markers()
    }

    fn bounds(&self, name: &str) -> Option<(f64, f64)> {
        self.series.finite_bounds(name)
    }

    fn date_range(&self, start: &str, end: &str) -> PyResult<(usize, usize)> {
        let range = self.series.date_range(start, end).map_err(to_py_error)?;
        Ok((*range.start(), *range.end()))
    }

    /// `x`/`y` are a series label, the time-index label or a formula.
    #[pyo3(signature = (x, y, start, end, smoothed = None))]
    fn compare<'py>(
        &self,
        py: Python<'py>,
        x: &str,
        y: &str,
        start: &str,
        end: &str,
        smoothed: Option<bool>,
    ) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
        let range = self.series.date_range(start, end).map_err(to_py_error)?;
        let mode = Self::mode(smoothed, self.settings.display_mode);
        let comparison = Comparison::new(
            SeriesView::new(&self.series, &self.cache, mode),
            &self.symbols,
            self.settings.time_index_base,
        );
        let (xs, ys) = comparison
            .scatter(&self.axis_source(x), &self.axis_source(y), &range)
            .map_err(to_py_error)?;
        Ok((
            PyArray1::from_owned_array(py, xs),
            PyArray1::from_owned_array(py, ys),
        ))
    }
}
