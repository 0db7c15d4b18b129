//! Deviation of a forecast from a historical baseline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::SeriesError,
    model::{DailyReading, validate_series},
};

pub const DEFAULT_DEVIATION_C: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    HeatAnomaly,
    ColdAnomaly,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            AnomalyKind::HeatAnomaly => "heat anomaly",
            AnomalyKind::ColdAnomaly => "cold anomaly",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    Moderate,
    Extreme,
}

impl std::fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            AnomalySeverity::Moderate => "moderate",
            AnomalySeverity::Extreme => "extreme",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub date: NaiveDate,
    pub kind: AnomalyKind,
    pub observed_temperature: f64,
    pub baseline_temperature: f64,
    pub absolute_difference: f64,
    pub severity: AnomalySeverity,
}

/// Flags days where `current` deviates from `baseline` by more than
/// `deviation_threshold`.
///
/// Pairs readings by position, not by date. When the series differ in
/// length only the common prefix is compared. The record carries the date
/// of the `current` reading.
pub fn compare_to_baseline(
    current: &[DailyReading],
    baseline: &[DailyReading],
    deviation_threshold: f64,
) -> Result<Vec<AnomalyRecord>, SeriesError> {
    if !deviation_threshold.is_finite() || deviation_threshold < 0.0 {
        return Err(SeriesError::InvalidThreshold(deviation_threshold));
    }
    validate_series(current)?;
    validate_series(baseline)?;

    let records = current
        .iter()
        .zip(baseline)
        .filter_map(|(observed, reference)| {
            let signed = observed.temperature - reference.temperature;
            let difference = signed.abs();

            if difference <= deviation_threshold {
                return None;
            }

            Some(AnomalyRecord {
                date: observed.date,
                kind: if signed > 0.0 { AnomalyKind::HeatAnomaly } else { AnomalyKind::ColdAnomaly },
                observed_temperature: observed.temperature,
                baseline_temperature: reference.temperature,
                absolute_difference: difference,
                severity: if difference > deviation_threshold * 2.0 {
                    AnomalySeverity::Extreme
                } else {
                    AnomalySeverity::Moderate
                },
            })
        })
        .collect();

    Ok(records)
}
