use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::SeriesError,
    model::{CurrentConditions, ForecastDay, HistoricalDay, HourlyReading, Location},
    provider::truncate_body,
};

use super::WeatherProvider;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

pub const MAX_FORECAST_DAYS: u32 = 16;
pub const MAX_FORECAST_HOURS: u32 = 48;

/// Open-Meteo: free, keyless forecasts, current conditions and the ERA5
/// archive.
#[derive(Debug, Clone, Default)]
pub struct OpenMeteoProvider {
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }

    async fn get(&self, url: &str, query: &[(&str, String)], what: &str) -> Result<String> {
        debug!(url, what, "Open-Meteo request");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Open-Meteo ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read Open-Meteo {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo {what} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }
}

fn coordinates(location: &Location) -> [(&'static str, String); 2] {
    [("latitude", location.latitude.to_string()), ("longitude", location.longitude.to_string())]
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: i64,
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    weather_code: u8,
}

#[derive(Debug, Deserialize)]
struct OmCurrentResponse {
    current: OmCurrent,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<NaiveDate>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmDailyResponse {
    daily: OmDaily,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmHourlyResponse {
    hourly: OmHourly,
}

impl OmDaily {
    fn required(values: &[Option<f64>], index: usize, date: NaiveDate, field: &str) -> Result<f64> {
        values
            .get(index)
            .copied()
            .flatten()
            .ok_or_else(|| anyhow!("Open-Meteo returned no {field} for {date}"))
    }

    fn optional(values: &[Option<f64>], index: usize) -> f64 {
        values.get(index).copied().flatten().unwrap_or(0.0)
    }
}

pub(crate) fn parse_current(body: &str, location: &Location) -> Result<CurrentConditions> {
    let parsed: OmCurrentResponse =
        serde_json::from_str(body).context("Failed to parse Open-Meteo current JSON")?;
    let current = parsed.current;

    Ok(CurrentConditions {
        provider: "openmeteo".to_string(),
        location: location.label(),
        temperature_c: current.temperature_2m,
        feels_like_c: current.apparent_temperature,
        humidity_pct: current.relative_humidity_2m,
        wind_speed_kmh: current.wind_speed_10m,
        description: describe_weather_code(current.weather_code).to_string(),
        observation_time: DateTime::from_timestamp(current.time, 0).unwrap_or_else(Utc::now),
    })
}

pub(crate) fn parse_forecast(body: &str) -> Result<Vec<ForecastDay>> {
    let parsed: OmDailyResponse =
        serde_json::from_str(body).context("Failed to parse Open-Meteo forecast JSON")?;
    let daily = parsed.daily;

    if daily.time.is_empty() {
        return Err(SeriesError::Empty("Open-Meteo forecast").into());
    }

    daily
        .time
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            Ok(ForecastDay {
                date,
                max_c: OmDaily::required(&daily.temperature_2m_max, i, date, "maximum temperature")?,
                min_c: OmDaily::required(&daily.temperature_2m_min, i, date, "minimum temperature")?,
                precipitation_mm: OmDaily::optional(&daily.precipitation_sum, i),
                wind_speed_kmh: OmDaily::optional(&daily.wind_speed_10m_max, i),
                humidity_pct: None,
            })
        })
        .collect()
}

pub(crate) fn parse_history(body: &str) -> Result<Vec<HistoricalDay>> {
    let parsed: OmDailyResponse =
        serde_json::from_str(body).context("Failed to parse Open-Meteo archive JSON")?;
    let daily = parsed.daily;

    if daily.time.is_empty() {
        return Err(SeriesError::Empty("Open-Meteo archive").into());
    }

    daily
        .time
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            Ok(HistoricalDay {
                date,
                max_c: OmDaily::required(&daily.temperature_2m_max, i, date, "maximum temperature")?,
                min_c: OmDaily::required(&daily.temperature_2m_min, i, date, "minimum temperature")?,
                precipitation_mm: OmDaily::optional(&daily.precipitation_sum, i),
            })
        })
        .collect()
}

/// Local hourly timestamps come back as `2024-07-01T13:00`.
pub(crate) fn parse_hourly(body: &str, hours: u32) -> Result<Vec<HourlyReading>> {
    let parsed: OmHourlyResponse =
        serde_json::from_str(body).context("Failed to parse Open-Meteo hourly JSON")?;
    let hourly = parsed.hourly;

    if hourly.time.is_empty() {
        return Err(SeriesError::Empty("Open-Meteo hourly forecast").into());
    }

    hourly
        .time
        .iter()
        .take(hours as usize)
        .enumerate()
        .map(|(i, raw)| {
            let time = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
                .with_context(|| format!("Open-Meteo returned an invalid hour '{raw}'"))?;
            let temperature_c = hourly
                .temperature_2m
                .get(i)
                .copied()
                .flatten()
                .ok_or_else(|| anyhow!("Open-Meteo returned no temperature for {time}"))?;

            Ok(HourlyReading {
                time,
                temperature_c,
                humidity_pct: OmDaily::optional(&hourly.relative_humidity_2m, i),
                wind_speed_kmh: OmDaily::optional(&hourly.wind_speed_10m, i),
                precipitation_mm: OmDaily::optional(&hourly.precipitation, i),
            })
        })
        .collect()
}

/// WMO weather interpretation codes.
fn describe_weather_code(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 | 56 | 57 => "Drizzle",
        61 | 63 | 65 | 66 | 67 => "Rain",
        71 | 73 | 75 | 77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn current(&self, location: &Location) -> Result<CurrentConditions> {
        let mut query = coordinates(location).to_vec();
        query.extend([
            (
                "current",
                "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,weather_code"
                    .to_string(),
            ),
            ("timeformat", "unixtime".to_string()),
        ]);

        let body = self.get(FORECAST_URL, &query, "current").await?;
        parse_current(&body, location)
    }

    async fn daily_forecast(&self, location: &Location, days: u32) -> Result<Vec<ForecastDay>> {
        if days == 0 || days > MAX_FORECAST_DAYS {
            bail!(
                "Requested {days} forecast days; Open-Meteo supports 1..={MAX_FORECAST_DAYS}."
            );
        }

        let mut query = coordinates(location).to_vec();
        query.extend([
            (
                "daily",
                "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max"
                    .to_string(),
            ),
            ("timezone", "auto".to_string()),
            ("forecast_days", days.to_string()),
        ]);

        let body = self.get(FORECAST_URL, &query, "forecast").await?;
        parse_forecast(&body)
    }

    async fn hourly_forecast(&self, location: &Location, hours: u32) -> Result<Vec<HourlyReading>> {
        if hours == 0 || hours > MAX_FORECAST_HOURS {
            bail!(
                "Requested {hours} forecast hours; Open-Meteo hourly supports 1..={MAX_FORECAST_HOURS}."
            );
        }

        let mut query = coordinates(location).to_vec();
        query.extend([
            (
                "hourly",
                "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation".to_string(),
            ),
            ("timezone", "auto".to_string()),
            ("forecast_days", hours.div_ceil(24).to_string()),
        ]);

        let body = self.get(FORECAST_URL, &query, "hourly").await?;
        parse_hourly(&body, hours)
    }

    async fn history(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalDay>> {
        if start > end {
            bail!("History start date {start} is after end date {end}.");
        }

        let mut query = coordinates(location).to_vec();
        query.extend([
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
            (
                "daily",
                "temperature_2m_max,temperature_2m_min,precipitation_sum".to_string(),
            ),
            ("timezone", "auto".to_string()),
        ]);

        let body = self.get(ARCHIVE_URL, &query, "archive").await?;
        parse_history(&body)
    }
}
