//! Heat wave and cold wave detection.
//!
//! A wave is a run of consecutive readings that all meet a temperature
//! threshold, lasting at least a minimum number of days. "Consecutive" means
//! adjacent in the input slice: dates are checked for order but gaps between
//! them are not detected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::SeriesError,
    model::{DailyReading, ForecastDay, validate_series},
};

pub const HEAT_WAVE_THRESHOLD_C: f64 = 35.0;
pub const COLD_WAVE_THRESHOLD_C: f64 = 10.0;
pub const MINIMUM_RUN_DAYS: usize = 3;

/// Which side of the threshold qualifies a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `temperature >= threshold`
    AtLeast,
    /// `temperature <= threshold`
    AtMost,
}

impl Direction {
    fn qualifies(self, temperature: f64, threshold: f64) -> bool {
        match self {
            Direction::AtLeast => temperature >= threshold,
            Direction::AtMost => temperature <= threshold,
        }
    }

    fn more_extreme(self, a: f64, b: f64) -> f64 {
        match self {
            Direction::AtLeast => a.max(b),
            Direction::AtMost => a.min(b),
        }
    }
}

/// A closed run of qualifying days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: usize,
    /// Run maximum for `AtLeast`, run minimum for `AtMost`.
    pub extreme_temperature: f64,
}

/// Open run state while scanning.
struct Run {
    start: NaiveDate,
    end: NaiveDate,
    len: usize,
    extreme: f64,
}

impl Run {
    fn into_event(self) -> Event {
        Event {
            start_date: self.start,
            end_date: self.end,
            duration_days: self.len,
            extreme_temperature: self.extreme,
        }
    }
}

/// Finds every run of at least `minimum_run` consecutive readings meeting
/// `threshold` in the given direction.
///
/// Events come back in chronological order and never overlap. A
/// `minimum_run` of 0 behaves like 1. An empty series yields no events.
pub fn detect(
    series: &[DailyReading],
    threshold: f64,
    direction: Direction,
    minimum_run: usize,
) -> Result<Vec<Event>, SeriesError> {
    if !threshold.is_finite() {
        return Err(SeriesError::InvalidThreshold(threshold));
    }
    validate_series(series)?;

    let minimum_run = minimum_run.max(1);
    let mut events = Vec::new();
    let mut run: Option<Run> = None;

    for reading in series {
        if direction.qualifies(reading.temperature, threshold) {
            match run.as_mut() {
                Some(open) => {
                    open.end = reading.date;
                    open.len += 1;
                    open.extreme = direction.more_extreme(open.extreme, reading.temperature);
                }
                None => {
                    run = Some(Run {
                        start: reading.date,
                        end: reading.date,
                        len: 1,
                        extreme: reading.temperature,
                    });
                }
            }
        } else if let Some(closed) = run.take() {
            if closed.len >= minimum_run {
                events.push(closed.into_event());
            }
        }
    }

    // a run reaching the end of the series still counts
    if let Some(closed) = run.take() {
        if closed.len >= minimum_run {
            events.push(closed.into_event());
        }
    }

    Ok(events)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveKind {
    HeatWave,
    ColdWave,
}

impl WaveKind {
    pub fn direction(self) -> Direction {
        match self {
            WaveKind::HeatWave => Direction::AtLeast,
            WaveKind::ColdWave => Direction::AtMost,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WaveKind::HeatWave => "heat wave",
            WaveKind::ColdWave => "cold wave",
        }
    }

    /// Severity tier for a temperature reached during a wave of this kind.
    pub fn severity(self, temperature_c: f64) -> AlertSeverity {
        match self {
            WaveKind::HeatWave if temperature_c >= 42.0 => AlertSeverity::Extreme,
            WaveKind::HeatWave if temperature_c >= 38.0 => AlertSeverity::Severe,
            WaveKind::HeatWave => AlertSeverity::Warning,
            WaveKind::ColdWave if temperature_c < 0.0 => AlertSeverity::Extreme,
            WaveKind::ColdWave if temperature_c < 5.0 => AlertSeverity::Severe,
            WaveKind::ColdWave => AlertSeverity::Warning,
        }
    }
}

impl std::fmt::Display for WaveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Severe,
    Extreme,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            AlertSeverity::Warning => "warning",
            AlertSeverity::Severe => "severe",
            AlertSeverity::Extreme => "extreme",
        })
    }
}

/// Threshold and minimum duration for one kind of wave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveCriteria {
    pub threshold_c: f64,
    pub minimum_run: usize,
}

impl WaveCriteria {
    pub const fn heat() -> Self {
        Self { threshold_c: HEAT_WAVE_THRESHOLD_C, minimum_run: MINIMUM_RUN_DAYS }
    }

    pub const fn cold() -> Self {
        Self { threshold_c: COLD_WAVE_THRESHOLD_C, minimum_run: MINIMUM_RUN_DAYS }
    }
}

pub fn detect_waves(
    kind: WaveKind,
    series: &[DailyReading],
    criteria: WaveCriteria,
) -> Result<Vec<Event>, SeriesError> {
    detect(series, criteria.threshold_c, kind.direction(), criteria.minimum_run)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveAlert {
    pub kind: WaveKind,
    pub severity: AlertSeverity,
    #[serde(flatten)]
    pub event: Event,
}

impl WaveAlert {
    pub fn new(kind: WaveKind, event: Event) -> Self {
        Self { kind, severity: kind.severity(event.extreme_temperature), event }
    }
}

fn alerts_for(
    kind: WaveKind,
    series: &[DailyReading],
    criteria: WaveCriteria,
) -> Result<impl Iterator<Item = WaveAlert>, SeriesError> {
    Ok(detect_waves(kind, series, criteria)?.into_iter().map(move |e| WaveAlert::new(kind, e)))
}

/// Heat and/or cold waves over a single series, merged in start-date order.
pub fn scan_series(
    series: &[DailyReading],
    heat: Option<WaveCriteria>,
    cold: Option<WaveCriteria>,
) -> Result<Vec<WaveAlert>, SeriesError> {
    let mut alerts = Vec::new();
    if let Some(heat) = heat {
        alerts.extend(alerts_for(WaveKind::HeatWave, series, heat)?);
    }
    if let Some(cold) = cold {
        alerts.extend(alerts_for(WaveKind::ColdWave, series, cold)?);
    }

    alerts.sort_by_key(|a| a.event.start_date);
    Ok(alerts)
}

/// Heat waves over daily maxima and cold waves over daily minima, merged in
/// start-date order.
pub fn scan_forecast(
    days: &[ForecastDay],
    heat: WaveCriteria,
    cold: WaveCriteria,
) -> Result<Vec<WaveAlert>, SeriesError> {
    let maxima: Vec<DailyReading> = days.iter().map(ForecastDay::max_reading).collect();
    let minima: Vec<DailyReading> = days.iter().map(ForecastDay::min_reading).collect();

    let mut alerts: Vec<WaveAlert> = alerts_for(WaveKind::HeatWave, &maxima, heat)?
        .chain(alerts_for(WaveKind::ColdWave, &minima, cold)?)
        .collect();

    alerts.sort_by_key(|a| a.event.start_date);
    Ok(alerts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(temps: &[f64]) -> Vec<DailyReading> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        temps
            .iter()
            .enumerate()
            .map(|(i, t)| DailyReading::new(start + chrono::Days::new(i as u64), *t))
            .collect()
    }

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    #[test]
    fn heat_scenario_two_events() {
        let s = series(&[30.0, 36.0, 37.0, 38.0, 32.0, 40.0, 41.0, 42.0, 33.0]);
        let events = detect(&s, 35.0, Direction::AtLeast, 3).unwrap();

        assert_eq!(
            events,
            vec![
                Event {
                    start_date: day(2),
                    end_date: day(4),
                    duration_days: 3,
                    extreme_temperature: 38.0
                },
                Event {
                    start_date: day(6),
                    end_date: day(8),
                    duration_days: 3,
                    extreme_temperature: 42.0
                },
            ]
        );
    }

    #[test]
    fn cold_scenario_keeps_run_through_values_at_threshold() {
        let s = series(&[12.0, 9.0, 8.0, 7.0, 11.0, 6.0, 5.0, 9.0, 4.0]);
        let events = detect(&s, 10.0, Direction::AtMost, 3).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!((events[0].start_date, events[0].end_date), (day(2), day(4)));
        assert_eq!(events[0].extreme_temperature, 7.0);
        assert_eq!((events[1].start_date, events[1].end_date), (day(6), day(9)));
        assert_eq!(events[1].duration_days, 4);
        assert_eq!(events[1].extreme_temperature, 4.0);
    }

    #[test]
    fn trailing_run_is_closed() {
        let s = series(&[20.0, 36.0, 37.0, 38.0]);
        let events = detect(&s, 35.0, Direction::AtLeast, 3).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_date, day(2));
        assert_eq!(events[0].end_date, day(4));
        assert_eq!(events[0].extreme_temperature, 38.0);
    }

    #[test]
    fn minimum_run_boundary_is_inclusive() {
        let exact = series(&[36.0, 36.0, 36.0, 20.0]);
        assert_eq!(detect(&exact, 35.0, Direction::AtLeast, 3).unwrap().len(), 1);

        let short = series(&[36.0, 36.0, 20.0, 36.0, 36.0]);
        assert!(detect(&short, 35.0, Direction::AtLeast, 3).unwrap().is_empty());
    }

    #[test]
    fn runs_split_by_one_day_are_not_merged() {
        let s = series(&[36.0, 36.0, 36.0, 30.0, 36.0, 36.0, 36.0]);
        let events = detect(&s, 35.0, Direction::AtLeast, 3).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].end_date, day(3));
        assert_eq!(events[1].start_date, day(5));
    }

    #[test]
    fn no_qualifying_day_yields_nothing() {
        let s = series(&[20.0, 21.0, 22.0, 34.9]);
        assert!(detect(&s, 35.0, Direction::AtLeast, 1).unwrap().is_empty());
    }

    #[test]
    fn every_day_qualifying_yields_one_whole_series_event() {
        let s = series(&[36.0, 37.0, 35.0, 39.0]);
        let events = detect(&s, 35.0, Direction::AtLeast, 3).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_date, day(1));
        assert_eq!(events[0].end_date, day(4));
        assert_eq!(events[0].duration_days, 4);

        assert!(detect(&s, 35.0, Direction::AtLeast, 5).unwrap().is_empty());
    }

    #[test]
    fn empty_series_is_not_an_error() {
        assert!(detect(&[], 35.0, Direction::AtLeast, 3).unwrap().is_empty());
    }

    #[test]
    fn zero_minimum_run_behaves_like_one() {
        let s = series(&[36.0, 20.0, 36.0]);
        let zero = detect(&s, 35.0, Direction::AtLeast, 0).unwrap();
        let one = detect(&s, 35.0, Direction::AtLeast, 1).unwrap();
        assert_eq!(zero, one);
        assert_eq!(zero.len(), 2);
    }

    #[test]
    fn detection_is_repeatable() {
        let s = series(&[30.0, 36.0, 37.0, 38.0, 32.0]);
        let first = detect(&s, 35.0, Direction::AtLeast, 3).unwrap();
        let second = detect(&s, 35.0, Direction::AtLeast, 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn nan_temperature_fails_loudly() {
        let s = series(&[36.0, f64::NAN, 36.0]);
        let err = detect(&s, 35.0, Direction::AtLeast, 1).unwrap_err();
        assert!(matches!(err, SeriesError::NonFiniteTemperature { index: 1, .. }));
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let s = series(&[36.0]);
        let err = detect(&s, f64::NAN, Direction::AtLeast, 1).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidThreshold(_)));
    }

    #[test]
    fn date_gaps_count_as_adjacent() {
        let s = vec![
            DailyReading::new(day(1), 36.0),
            DailyReading::new(day(10), 36.0),
            DailyReading::new(day(20), 36.0),
        ];
        let events = detect(&s, 35.0, Direction::AtLeast, 3).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration_days, 3);
    }

    #[test]
    fn severity_tiers() {
        assert_eq!(WaveKind::HeatWave.severity(35.0), AlertSeverity::Warning);
        assert_eq!(WaveKind::HeatWave.severity(38.0), AlertSeverity::Severe);
        assert_eq!(WaveKind::HeatWave.severity(42.0), AlertSeverity::Extreme);
        assert_eq!(WaveKind::ColdWave.severity(9.0), AlertSeverity::Warning);
        assert_eq!(WaveKind::ColdWave.severity(5.0), AlertSeverity::Warning);
        assert_eq!(WaveKind::ColdWave.severity(4.9), AlertSeverity::Severe);
        assert_eq!(WaveKind::ColdWave.severity(-0.5), AlertSeverity::Extreme);
    }

    #[test]
    fn scan_series_merges_kinds_in_date_order() {
        let s = series(&[5.0, 4.0, 3.0, 36.0, 37.0, 38.0, 2.0, 1.0, 0.0]);

        let both = scan_series(&s, Some(WaveCriteria::heat()), Some(WaveCriteria::cold())).unwrap();
        let kinds: Vec<WaveKind> = both.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![WaveKind::ColdWave, WaveKind::HeatWave, WaveKind::ColdWave]);

        let heat_only = scan_series(&s, Some(WaveCriteria::heat()), None).unwrap();
        assert_eq!(heat_only.len(), 1);
        assert_eq!(heat_only[0].severity, AlertSeverity::Severe);

        assert!(scan_series(&s, None, None).unwrap().is_empty());
    }

    #[test]
    fn scan_forecast_uses_maxima_for_heat_and_minima_for_cold() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let ranges = [
            (36.0, 20.0),
            (39.0, 21.0),
            (37.0, 22.0),
            (20.0, 8.0),
            (18.0, 3.0),
            (19.0, 9.0),
        ];
        let days: Vec<ForecastDay> = ranges
            .iter()
            .enumerate()
            .map(|(i, (max, min))| ForecastDay {
                date: start + chrono::Days::new(i as u64),
                max_c: *max,
                min_c: *min,
                precipitation_mm: 0.0,
                wind_speed_kmh: 5.0,
                humidity_pct: None,
            })
            .collect();

        let alerts = scan_forecast(&days, WaveCriteria::heat(), WaveCriteria::cold()).unwrap();

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, WaveKind::HeatWave);
        assert_eq!(alerts[0].severity, AlertSeverity::Severe);
        assert_eq!(alerts[0].event.extreme_temperature, 39.0);
        assert_eq!(alerts[1].kind, WaveKind::ColdWave);
        assert_eq!(alerts[1].severity, AlertSeverity::Severe);
        assert_eq!(alerts[1].event.start_date, day(4));
        assert_eq!(alerts[1].event.extreme_temperature, 3.0);
    }
}
