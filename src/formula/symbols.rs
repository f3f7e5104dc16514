use std::collections::{BTreeMap, HashMap};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::FormulaError;

const FIRST_SYMBOL: u8 = b'A';
const MAX_SYMBOLS: usize = 26;

/// What a formula symbol stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolBinding {
    /// A named metric series, resolved through a [`SeriesLookup`].
    Series(String),
    /// The implicit elapsed-time series.
    TimeIndex,
}

/// Single-character symbols bound to series, in the order they were assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    entries: Vec<(char, SymbolBinding)>,
    time_label: Option<String>,
}

impl SymbolTable {
    /// Assign `A`, `B`, ... to each label in order, then the next letter to
    /// the time index.
    pub fn from_labels<S: AsRef<str>>(
        labels: &[S],
        time_label: &str,
    ) -> Result<Self, FormulaError> {
        let count = labels.len() + 1;
        if count > MAX_SYMBOLS {
            return Err(FormulaError::TooManySymbols { count });
        }

        let mut entries: Vec<(char, SymbolBinding)> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (symbol_at(i), SymbolBinding::Series(label.as_ref().to_string())))
            .collect();
        entries.push((symbol_at(labels.len()), SymbolBinding::TimeIndex));

        Ok(SymbolTable {
            entries,
            time_label: Some(time_label.to_string()),
        })
    }

    /// Build a table from explicit pairs, e.g. a mapping handed over from Python.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (char, SymbolBinding)>,
    {
        SymbolTable {
            entries: pairs.into_iter().collect(),
            time_label: None,
        }
    }

    /// Build a table from a `symbol -> name` mapping; names for which
    /// `is_series` is false stand for the time index. Symbols are sorted.
    pub fn from_named_pairs<I, F>(pairs: I, is_series: F) -> Self
    where
        I: IntoIterator<Item = (char, String)>,
        F: Fn(&str) -> bool,
    {
        let mut entries: Vec<(char, SymbolBinding)> = pairs
            .into_iter()
            .map(|(symbol, name)| {
                let binding = if is_series(&name) {
                    SymbolBinding::Series(name)
                } else {
                    SymbolBinding::TimeIndex
                };
                (symbol, binding)
            })
            .collect();
        entries.sort_by_key(|(symbol, _)| *symbol);
        Self::from_pairs(entries)
    }

    pub fn resolve(&self, symbol: char) -> Option<&SymbolBinding> {
        self.entries
            .iter()
            .find(|(c, _)| *c == symbol)
            .map(|(_, binding)| binding)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(char, SymbolBinding)> {
        self.entries.iter()
    }

    /// Human readable name of whatever a binding points at.
    pub fn label_of<'a>(&'a self, binding: &'a SymbolBinding) -> &'a str {
        match binding {
            SymbolBinding::Series(name) => name,
            SymbolBinding::TimeIndex => self.time_label.as_deref().unwrap_or("Time index"),
        }
    }

    /// One `"A: label"` line per symbol, shown to the user as formula help.
    pub fn legend(&self) -> String {
        self.entries
            .iter()
            .map(|(symbol, binding)| format!("{}: {}", symbol, self.label_of(binding)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn symbol_at(index: usize) -> char {
    (FIRST_SYMBOL + index as u8) as char
}

/// Name -> series resolution used by the formula evaluator.
pub trait SeriesLookup {
    fn series(&self, name: &str) -> Option<&Array1<f64>>;
}

impl SeriesLookup for HashMap<String, Array1<f64>> {
    fn series(&self, name: &str) -> Option<&Array1<f64>> {
        self.get(name)
    }
}

impl SeriesLookup for BTreeMap<String, Array1<f64>> {
    fn series(&self, name: &str) -> Option<&Array1<f64>> {
        self.get(name)
    }
}

impl<T: SeriesLookup + ?Sized> SeriesLookup for &T {
    fn series(&self, name: &str) -> Option<&Array1<f64>> {
        (**self).series(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_letters_in_label_order_then_time_index() {
        let table = SymbolTable::from_labels(&["Weight [kg]", "Waist [cm]"], "Days").unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.resolve('A'), Some(&SymbolBinding::Series("Weight [kg]".into())));
        assert_eq!(table.resolve('B'), Some(&SymbolBinding::Series("Waist [cm]".into())));
        assert_eq!(table.resolve('C'), Some(&SymbolBinding::TimeIndex));
        assert_eq!(table.resolve('D'), None);
    }

    #[test]
    fn legend_lists_every_symbol() {
        let table = SymbolTable::from_labels(&["Weight [kg]"], "Days").unwrap();
        assert_eq!(table.legend(), "A: Weight [kg]\nB: Days");
    }

    #[test]
    fn unknown_names_in_mapping_mean_time_index() {
        let pairs = vec![('B', "Days".to_string()), ('A', "Weight [kg]".to_string())];
        let table = SymbolTable::from_named_pairs(pairs, |name| name == "Weight [kg]");

        let symbols: Vec<char> = table.iter().map(|(symbol, _)| *symbol).collect();
        assert_eq!(symbols, vec!['A', 'B']);
        assert_eq!(table.resolve('A'), Some(&SymbolBinding::Series("Weight [kg]".into())));
        assert_eq!(table.resolve('B'), Some(&SymbolBinding::TimeIndex));
    }

    #[test]
    fn rejects_more_labels_than_letters() {
        let labels: Vec<String> = (0..26).map(|i| format!("m{i}")).collect();
        let err = SymbolTable::from_labels(&labels, "Days").unwrap_err();
        assert_eq!(err, FormulaError::TooManySymbols { count: 27 });
    }
}
