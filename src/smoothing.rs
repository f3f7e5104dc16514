pub mod cache;
pub mod moving_average;

pub use cache::SmoothedSeriesCache;
pub use moving_average::moving_average;
