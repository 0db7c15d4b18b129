use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// One temperature value per calendar day, in °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyReading {
    pub date: NaiveDate,
    pub temperature: f64,
}

impl DailyReading {
    pub fn new(date: NaiveDate, temperature: f64) -> Self {
        Self { date, temperature }
    }
}

/// Checks that every temperature is finite and dates strictly increase.
///
/// Gaps between dates are allowed: callers that need calendar contiguity
/// must check it themselves.
pub fn validate_series(series: &[DailyReading]) -> Result<(), SeriesError> {
    let mut previous: Option<NaiveDate> = None;

    for (index, reading) in series.iter().enumerate() {
        if !reading.temperature.is_finite() {
            return Err(SeriesError::NonFiniteTemperature { index, date: reading.date });
        }

        match previous {
            Some(previous) if reading.date <= previous => {
                return Err(SeriesError::NotAscending { index, previous, date: reading.date });
            }
            _ => {}
        }

        previous = Some(reading.date);
    }

    Ok(())
}

/// A monitored place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// Daily forecast entry as returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub max_c: f64,
    pub min_c: f64,
    pub precipitation_mm: f64,
    pub wind_speed_kmh: f64,
    pub humidity_pct: Option<f64>,
}

impl ForecastDay {
    pub fn max_reading(&self) -> DailyReading {
        DailyReading::new(self.date, self.max_c)
    }

    pub fn min_reading(&self) -> DailyReading {
        DailyReading::new(self.date, self.min_c)
    }

    pub fn mean_c(&self) -> f64 {
        (self.max_c + self.min_c) / 2.0
    }

    pub fn mean_reading(&self) -> DailyReading {
        DailyReading::new(self.date, self.mean_c())
    }
}

/// Observed daily record from the historical archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDay {
    pub date: NaiveDate,
    pub max_c: f64,
    pub min_c: f64,
    pub precipitation_mm: f64,
}

impl HistoricalDay {
    /// Baseline value for anomaly comparison: midpoint of the daily range.
    pub fn mean_reading(&self) -> DailyReading {
        DailyReading::new(self.date, (self.max_c + self.min_c) / 2.0)
    }
}

/// One hour of the short-term forecast, in the location's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyReading {
    pub time: NaiveDateTime,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    pub precipitation_mm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub provider: String,
    pub location: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    pub description: String,
    pub observation_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn validate_accepts_empty_and_gapped_series() {
        assert!(validate_series(&[]).is_ok());

        let gapped = [DailyReading::new(day(1), 20.0), DailyReading::new(day(5), 21.0)];
        assert!(validate_series(&gapped).is_ok());
    }

    #[test]
    fn validate_rejects_nan() {
        let series = [DailyReading::new(day(1), 20.0), DailyReading::new(day(2), f64::NAN)];
        let err = validate_series(&series).unwrap_err();
        assert_eq!(err, SeriesError::NonFiniteTemperature { index: 1, date: day(2) });
    }

    #[test]
    fn validate_rejects_duplicate_and_descending_dates() {
        let dup = [DailyReading::new(day(2), 20.0), DailyReading::new(day(2), 21.0)];
        assert!(matches!(
            validate_series(&dup),
            Err(SeriesError::NotAscending { index: 1, .. })
        ));

        let desc = [DailyReading::new(day(3), 20.0), DailyReading::new(day(1), 21.0)];
        let err = validate_series(&desc).unwrap_err();
        assert!(err.to_string().contains("not in ascending date order"));
    }

    #[test]
    fn forecast_day_projections() {
        let fd = ForecastDay {
            date: day(1),
            max_c: 30.0,
            min_c: 20.0,
            precipitation_mm: 0.0,
            wind_speed_kmh: 10.0,
            humidity_pct: None,
        };
        assert_eq!(fd.max_reading().temperature, 30.0);
        assert_eq!(fd.min_reading().temperature, 20.0);
        assert_eq!(fd.mean_reading().temperature, 25.0);
    }

    #[test]
    fn reading_deserializes_from_iso_date() {
        let r: DailyReading =
            serde_json::from_str(r#"{"date":"2024-03-01","temperature":36.5}"#).unwrap();
        assert_eq!(r, DailyReading::new(day(1), 36.5));
    }
}
