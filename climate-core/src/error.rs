use chrono::NaiveDate;
use thiserror::Error;

/// Malformed input handed to the detector or the anomaly comparator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("temperature at index {index} ({date}) is not a finite number")]
    NonFiniteTemperature { index: usize, date: NaiveDate },

    #[error("readings are not in ascending date order: index {index} ({date}) follows {previous}")]
    NotAscending {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("threshold {0} is out of range")]
    InvalidThreshold(f64),

    #[error("{0} series is empty")]
    Empty(&'static str),
}
