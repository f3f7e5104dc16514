//! Formula evaluation and smoothing for a body-metric log.
//!
//! The plotting front end loads the log, then asks this crate for moving
//! averages of each metric and for user formulas such as `(A+B)*2` evaluated
//! over whole series. Build with `--features python` for the extension module.

pub mod comparison;
pub mod error;
pub mod formula;
pub mod series;
pub mod settings;
pub mod smoothing;

#[cfg(feature = "python")]
mod python;

pub use comparison::{AxisSource, Comparison, DisplayMode, SeriesView};
pub use error::{FormulaError, SeriesError, SettingsError};
pub use formula::{
    evaluate, evaluate_formula, time_index, SeriesLookup, SymbolBinding, SymbolTable,
    TimeIndexBase,
};
pub use series::{Readout, SeriesSet};
pub use settings::Settings;
pub use smoothing::{moving_average, SmoothedSeriesCache};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn bodylog_rust(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(python::moving_average, m)?)?;
    m.add_function(wrap_pyfunction!(python::evaluate, m)?)?;
    m.add_class::<python::FormulaEvaluator>()?;
    m.add_class::<python::BodyLog>()?;

    Ok(())
}
