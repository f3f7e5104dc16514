//! Canonical column layout of a body-metric log.
//!
//! The ingestion side hands over one date column, the numeric metric columns
//! and the free-text info columns, all with one entry per logged day. Missing
//! measurements are `NaN` (`null` in the JSON document).

use std::fmt;
use std::ops::RangeInclusive;

use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;
use crate::formula::{time_index, SeriesLookup, TimeIndexBase};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricColumn {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoColumn {
    pub label: String,
    pub values: Vec<String>,
}

/// JSON shape produced by the ingestion collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesDocument {
    /// `"YYYY,MM,DD"`, oldest first.
    pub dates: Vec<String>,
    pub metrics: Vec<MetricColumn>,
    pub info: Vec<InfoColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSet {
    dates: Vec<String>,
    metrics: Vec<(String, Array1<f64>)>,
    info: Vec<(String, Vec<String>)>,
}

impl SeriesSet {
    pub fn new(
        dates: Vec<String>,
        metrics: Vec<(String, Array1<f64>)>,
        info: Vec<(String, Vec<String>)>,
    ) -> Result<Self, SeriesError> {
        let expected = dates.len();
        for (i, (name, values)) in metrics.iter().enumerate() {
            check_len(name, expected, values.len())?;
            if metrics[..i].iter().any(|(earlier, _)| earlier == name) {
                return Err(SeriesError::DuplicateSeries(name.clone()));
            }
        }
        for (name, values) in &info {
            check_len(name, expected, values.len())?;
        }
        Ok(SeriesSet {
            dates,
            metrics,
            info,
        })
    }

    pub fn from_document(doc: SeriesDocument) -> Result<Self, SeriesError> {
        let metrics = doc
            .metrics
            .into_iter()
            .map(|column| {
                let values = column
                    .values
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect::<Array1<f64>>();
                (column.label, values)
            })
            .collect();
        let info = doc
            .info
            .into_iter()
            .map(|column| (column.label, column.values))
            .collect();
        Self::new(doc.dates, metrics, info)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SeriesError> {
        let doc: SeriesDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    pub fn to_document(&self) -> SeriesDocument {
        SeriesDocument {
            dates: self.dates.clone(),
            metrics: self
                .metrics
                .iter()
                .map(|(label, values)| MetricColumn {
                    label: label.clone(),
                    values: values.iter().map(|v| v.is_finite().then_some(*v)).collect(),
                })
                .collect(),
            info: self
                .info
                .iter()
                .map(|(label, values)| InfoColumn {
                    label: label.clone(),
                    values: values.clone(),
                })
                .collect(),
        }
    }

    /// Number of samples shared by every column.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn labels(&self) -> Vec<&str> {
        self.metrics.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn metrics(&self) -> impl Iterator<Item = (&str, &Array1<f64>)> {
        self.metrics.iter().map(|(label, values)| (label.as_str(), values))
    }

    pub fn info_columns(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.info
            .iter()
            .map(|(label, values)| (label.as_str(), values.as_slice()))
    }

    pub fn get(&self, name: &str) -> Option<&Array1<f64>> {
        self.metrics
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, values)| values)
    }

    /// Swap in new samples for an existing metric.
    pub fn replace(&mut self, name: &str, values: Array1<f64>) -> Result<(), SeriesError> {
        check_len(name, self.len(), values.len())?;
        let slot = self
            .metrics
            .iter_mut()
            .find(|(label, _)| label == name)
            .ok_or_else(|| SeriesError::UnknownSeries(name.to_string()))?;
        slot.1 = values;
        Ok(())
    }

    pub fn time_index(&self, base: TimeIndexBase) -> Array1<f64> {
        time_index(self.len(), base)
    }

    pub fn date_index(&self, date: &str) -> Result<usize, SeriesError> {
        self.dates
            .iter()
            .position(|d| d == date)
            .ok_or_else(|| SeriesError::UnknownDate(date.to_string()))
    }

    /// Inclusive index range between two logged dates.
    pub fn date_range(&self, start: &str, end: &str) -> Result<RangeInclusive<usize>, SeriesError> {
        let start = self.date_index(start)?;
        let end = self.date_index(end)?;
        if start > end {
            return Err(SeriesError::InvalidRange { start, end });
        }
        Ok(start..=end)
    }

    /// `(index, year)` of every New Year's day in the log.
    pub fn year_markers(&self) -> Vec<(usize, String)> {
        self.dates
            .iter()
            .enumerate()
            .filter_map(|(i, date)| {
                let mut parts = date.split(',');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(year), Some("01"), Some("01")) => Some((i, year.to_string())),
                    _ => None,
                }
            })
            .collect()
    }

    /// Padded y-axis range of the finite samples of `name`.
    pub fn finite_bounds(&self, name: &str) -> Option<(f64, f64)> {
        let values = self.get(name)?;
        let (min, max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        Some((min * 0.95, max * 1.05))
    }

    /// Everything known about day `index`, with averages taken from `averages`.
    pub fn readout<L: SeriesLookup + ?Sized>(&self, index: usize, averages: &L) -> Option<Readout> {
        let date = self.dates.get(index)?.clone();
        let metrics = self
            .metrics
            .iter()
            .map(|(label, values)| {
                let (metric, unit) = split_label(label);
                MetricReadout {
                    metric: metric.to_string(),
                    unit: unit.to_string(),
                    value: finite(values[index]),
                    average: averages
                        .series(label)
                        .and_then(|avg| avg.get(index).copied())
                        .and_then(finite),
                }
            })
            .collect();
        let notes = self
            .info
            .iter()
            .map(|(label, values)| (label.clone(), values[index].clone()))
            .collect();
        Some(Readout {
            date,
            metrics,
            notes,
        })
    }
}

impl SeriesLookup for SeriesSet {
    fn series(&self, name: &str) -> Option<&Array1<f64>> {
        self.get(name)
    }
}

fn check_len(name: &str, expected: usize, got: usize) -> Result<(), SeriesError> {
    if got != expected {
        return Err(SeriesError::LengthMismatch {
            name: name.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Split `"Weight [kg]"` into `("Weight", "kg")`.
pub fn split_label(label: &str) -> (&str, &str) {
    match label.split_once(" [") {
        Some((metric, unit)) => (metric, unit.trim_end_matches(']')),
        None => (label, ""),
    }
}

/// Copy of `values` restricted to an inclusive index range, clipped to the array.
pub fn slice_range(values: &Array1<f64>, range: &RangeInclusive<usize>) -> Array1<f64> {
    let len = values.len();
    let start = *range.start();
    if start >= len {
        return Array1::zeros(0);
    }
    let end = (*range.end()).min(len - 1);
    values.slice(s![start..=end]).to_owned()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricReadout {
    pub metric: String,
    pub unit: String,
    pub value: Option<f64>,
    pub average: Option<f64>,
}

/// Crosshair info panel content for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct Readout {
    pub date: String,
    pub metrics: Vec<MetricReadout>,
    pub notes: Vec<(String, String)>,
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.date)?;
        for m in &self.metrics {
            match (m.value, m.average) {
                (Some(value), Some(avg)) => {
                    writeln!(f, "{}: {:.1} (Avg. {:.1}) {}", m.metric, value, avg, m.unit)?
                }
                (Some(value), None) => writeln!(f, "{}: {:.1} {}", m.metric, value, m.unit)?,
                (None, _) => writeln!(f, "{}:", m.metric)?,
            }
        }
        for (label, text) in &self.notes {
            write!(f, "\n{}:\n{}\n", label, text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SeriesSet {
        SeriesSet::new(
            vec!["2023,12,31".into(), "2024,01,01".into(), "2024,01,02".into()],
            vec![
                ("Weight [kg]".into(), Array1::from(vec![80.0, f64::NAN, 79.0])),
                ("Waist [cm]".into(), Array1::from(vec![90.0, 89.5, 89.0])),
            ],
            vec![("Notes".into(), vec!["".into(), "party".into(), "run".into()])],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = SeriesSet::new(
            vec!["2024,01,01".into()],
            vec![("Weight [kg]".into(), Array1::from(vec![1.0, 2.0]))],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::LengthMismatch { expected: 1, got: 2, .. }));
    }

    #[test]
    fn rejects_repeated_metric_label() {
        let json = r#"{
            "dates": ["2024,01,01", "2024,01,02"],
            "metrics": [
                { "label": "Weight [kg]", "values": [1.0, 1.0] },
                { "label": "Weight [kg]", "values": [9.0, 9.0] }
            ]
        }"#;
        let err = SeriesSet::from_json_str(json).unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateSeries(name) if name == "Weight [kg]"));
    }

    #[test]
    fn finds_new_year_markers() {
        assert_eq!(sample().year_markers(), vec![(1, "2024".to_string())]);
    }

    #[test]
    fn date_range_is_inclusive_and_ordered() {
        let set = sample();
        assert_eq!(set.date_range("2023,12,31", "2024,01,02").unwrap(), 0..=2);
        assert!(matches!(
            set.date_range("2024,01,02", "2023,12,31"),
            Err(SeriesError::InvalidRange { start: 2, end: 0 })
        ));
        assert!(matches!(set.date_index("1999,01,01"), Err(SeriesError::UnknownDate(_))));
    }

    #[test]
    fn bounds_skip_missing_samples() {
        let (lo, hi) = sample().finite_bounds("Weight [kg]").unwrap();
        assert!((lo - 79.0 * 0.95).abs() < 1e-12);
        assert!((hi - 80.0 * 1.05).abs() < 1e-12);
    }

    #[test]
    fn readout_formats_missing_values_without_number() {
        let set = sample();
        let text = set.readout(1, &set).unwrap().to_string();
        assert_eq!(text, "2024,01,01\nWeight:\nWaist: 89.5 (Avg. 89.5) cm\n\nNotes:\nparty\n");
    }

    #[test]
    fn split_label_without_unit() {
        assert_eq!(split_label("Body fat [%]"), ("Body fat", "%"));
        assert_eq!(split_label("Mood"), ("Mood", ""));
    }

    #[test]
    fn slice_range_clips_to_length() {
        let values = Array1::from(vec![1.0, 2.0, 3.0]);
        assert_eq!(slice_range(&values, &(1..=10)), Array1::from(vec![2.0, 3.0]));
        assert_eq!(slice_range(&values, &(5..=6)).len(), 0);
    }
}
