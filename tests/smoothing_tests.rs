//! Moving average smoothing and the smoothed-series cache.
//!
//! ## Test Organization
//!
//! 1. **Moving average** - constants, gaps, start-of-series widening, short series
//! 2. **Cache** - window changes, lookups through the comparison view

use approx::assert_relative_eq;
use bodylog_rust::{
    evaluate_formula, moving_average, DisplayMode, SeriesError, SeriesSet, SeriesView,
    SmoothedSeriesCache, SymbolTable, TimeIndexBase,
};
use ndarray::Array1;

// ============================================================================
// Moving average
// ============================================================================

#[test]
fn test_constant_series_is_unchanged() {
    for len in [1usize, 2, 5, 17] {
        let data = Array1::from_elem(len, 72.4);
        for window in 1..=10 {
            let out = moving_average(&data, window).unwrap();
            assert_eq!(out.len(), len);
            for &v in &out {
                assert_relative_eq!(v, 72.4, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn test_missing_samples_stay_missing() {
    let data = Array1::from(vec![f64::NAN, 80.0, f64::NAN, 81.0, 79.5, f64::NAN, 80.5]);
    for window in 1..=8 {
        let out = moving_average(&data, window).unwrap();
        for (raw, smooth) in data.iter().zip(out.iter()) {
            if raw.is_nan() {
                assert!(smooth.is_nan(), "window {window}");
            }
        }
        // interior samples always count themselves
        for i in 1..6 {
            assert_eq!(data[i].is_nan(), out[i].is_nan(), "window {window}, index {i}");
        }
    }
}

#[test]
fn test_sparse_series_example() {
    let data = Array1::from(vec![f64::NAN, 1.0, 2.0, 3.0, f64::NAN]);
    let out = moving_average(&data, 3).unwrap();

    assert!(out[0].is_nan());
    assert_relative_eq!(out[1], 1.0);
    assert_relative_eq!(out[2], 2.0);
    assert_relative_eq!(out[3], 2.5);
    assert!(out[4].is_nan());
}

#[test]
fn test_window_widens_from_series_start() {
    let data = Array1::from_iter((0..10).map(f64::from));
    let out = moving_average(&data, 5).unwrap();

    assert_relative_eq!(out[0], 0.0); // 0..1
    assert_relative_eq!(out[1], 0.5); // 0..2
    assert_relative_eq!(out[2], 1.5); // 0..4
    assert_relative_eq!(out[3], 3.0); // 1..6
    assert_relative_eq!(out[9], 7.5); // 7..9, the last sample is not included
}

#[test]
fn test_window_longer_than_series() {
    let data = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
    let out = moving_average(&data, 10).unwrap();
    assert_eq!(out, Array1::from(vec![1.0, 1.5, 2.5, 2.5]));
}

#[test]
fn test_only_finite_neighbours_contribute() {
    let data = Array1::from(vec![1.0, f64::NAN, 3.0, 5.0, 7.0]);
    let out = moving_average(&data, 3).unwrap();
    assert_relative_eq!(out[2], 4.0); // NaN, 3, 5
}

#[test]
fn test_empty_series() {
    let out = moving_average(&Array1::<f64>::zeros(0), 7).unwrap();
    assert_eq!(out.len(), 0);
}

#[test]
fn test_zero_window_is_an_error() {
    let data = Array1::from(vec![1.0]);
    assert!(matches!(
        moving_average(&data, 0),
        Err(SeriesError::InvalidWindow(0))
    ));
}

// ============================================================================
// Cache
// ============================================================================

const LOG: &str = r#"{
    "dates": ["2023,12,30", "2023,12,31", "2024,01,01", "2024,01,02", "2024,01,03"],
    "metrics": [
        { "label": "Weight [kg]", "values": [80.0, null, 79.0, 78.0, 77.0] },
        { "label": "Waist [cm]", "values": [90.0, 91.0, 92.0, 93.0, 94.0] }
    ],
    "info": [
        { "label": "Activity", "values": ["", "run", "", "swim", ""] }
    ]
}"#;

#[test]
fn test_json_nulls_become_missing_samples() {
    let set = SeriesSet::from_json_str(LOG).unwrap();
    assert_eq!(set.len(), 5);
    assert!(set.get("Weight [kg]").unwrap()[1].is_nan());
    assert_eq!(set.year_markers(), vec![(2, "2024".to_string())]);
}

#[test]
fn test_cache_tracks_window_changes() {
    let set = SeriesSet::from_json_str(LOG).unwrap();
    let mut cache = SmoothedSeriesCache::new(&set, 1).unwrap();
    assert_eq!(cache.get("Waist [cm]"), set.get("Waist [cm]"));

    assert!(cache.set_window(&set, 3).unwrap());
    let waist = cache.get("Waist [cm]").unwrap();
    assert_eq!(waist, &moving_average(set.get("Waist [cm]").unwrap(), 3).unwrap());
    assert!(cache.get("Weight [kg]").unwrap()[1].is_nan());
}

#[test]
fn test_formula_over_smoothed_view() {
    let set = SeriesSet::from_json_str(LOG).unwrap();
    let cache = SmoothedSeriesCache::new(&set, 3).unwrap();
    let symbols = SymbolTable::from_labels(&set.labels(), "Days").unwrap();
    let days = set.time_index(TimeIndexBase::One);

    let raw_view = SeriesView::new(&set, &cache, DisplayMode::Raw);
    let smooth_view = SeriesView::new(&set, &cache, DisplayMode::Smoothed);

    let raw = evaluate_formula("B-C", &symbols, &raw_view, &days).unwrap();
    let smooth = evaluate_formula("B-C", &symbols, &smooth_view, &days).unwrap();

    assert_eq!(raw, Array1::from(vec![89.0, 89.0, 89.0, 89.0, 89.0]));
    let expected = cache.get("Waist [cm]").unwrap() - &days;
    assert_eq!(smooth, expected);
}
