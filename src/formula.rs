//! Infix formulas over named series.
//!
//! A formula combines single-character symbols, integer literals, parentheses
//! and `+ - * /`. Products and quotients are folded into the preceding term
//! first, then sums and differences are folded left to right. Every operation
//! is element-wise over arrays of the shared time-axis length.

pub mod parser;
pub mod symbols;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub use parser::{evaluate, evaluate_formula, MAX_NESTING};
pub use symbols::{SeriesLookup, SymbolBinding, SymbolTable};

/// First value of the implicit time-index series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeIndexBase {
    /// `0, 1, ..., N-1`, the chronological plot axis.
    Zero,
    /// `1, 2, ..., N`, what formulas see as elapsed days.
    #[default]
    One,
}

pub fn time_index(n: usize, base: TimeIndexBase) -> Array1<f64> {
    let first = match base {
        TimeIndexBase::Zero => 0.0,
        TimeIndexBase::One => 1.0,
    };
    Array1::from_iter((0..n).map(|i| first + i as f64))
}
