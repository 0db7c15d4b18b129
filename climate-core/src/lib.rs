//! Core library for the `climate` CLI.
//!
//! This crate defines:
//! - Heat wave / cold wave detection over daily temperature series
//! - Forecast-versus-baseline anomaly detection
//! - Heat index and unit helpers
//! - The monitored location catalogue
//! - Abstraction over weather providers
//! - Configuration & credentials handling
//!
//! Detection and anomaly functions are pure and synchronous; only providers
//! perform I/O.

pub mod anomaly;
pub mod config;
pub mod error;
pub mod locations;
pub mod model;
pub mod provider;
pub mod series;
pub mod units;
pub mod waves;

pub use anomaly::{AnomalyKind, AnomalyRecord, AnomalySeverity, compare_to_baseline};
pub use config::{Config, ProviderConfig, Thresholds};
pub use error::SeriesError;
pub use model::{
    CurrentConditions, DailyReading, ForecastDay, HistoricalDay, HourlyReading, Location,
};
pub use provider::{ProviderId, WeatherProvider};
pub use units::{TemperatureUnit, applicable_heat_index, heat_index};
pub use waves::{AlertSeverity, Direction, Event, WaveAlert, WaveCriteria, WaveKind, detect};
