use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::{
    error::SeriesError,
    model::{CurrentConditions, ForecastDay, HistoricalDay, HourlyReading, Location},
    provider::truncate_body,
};

use super::WeatherProvider;

/// The free 5-day / 3-hour forecast endpoint covers at most this many days.
pub const MAX_FORECAST_DAYS: u32 = 5;

const MPS_TO_KMH: f64 = 3.6;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }

    async fn get(&self, url: &str, location: &Location, what: &str) -> Result<String> {
        debug!(url, what, location = %location.label(), "OpenWeather request");

        let res = self
            .http
            .get(url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {what} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    #[serde(default)]
    temp_min: Option<f64>,
    #[serde(default)]
    temp_max: Option<f64>,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwRain {
    #[serde(rename = "3h", default)]
    three_hours: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    timezone: i64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    wind: OwWind,
    #[serde(default)]
    rain: Option<OwRain>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

pub(crate) fn parse_current(body: &str, location: &Location) -> Result<CurrentConditions> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather current JSON")?;

    let condition = parsed
        .weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(CurrentConditions {
        provider: "openweather".to_string(),
        location: location.label(),
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        wind_speed_kmh: parsed.wind.speed * MPS_TO_KMH,
        description: condition,
        observation_time: DateTime::from_timestamp(parsed.dt, 0).unwrap_or_else(Utc::now),
    })
}

#[derive(Default)]
struct DayAccumulator {
    max_c: f64,
    min_c: f64,
    precipitation_mm: f64,
    wind_max_kmh: f64,
    humidity_sum: f64,
    samples: u32,
}

/// Folds 3-hourly entries into one record per local calendar date.
pub(crate) fn parse_forecast(body: &str, days: u32) -> Result<Vec<ForecastDay>> {
    let parsed: OwForecastResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather forecast JSON")?;

    let mut by_date: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

    for entry in &parsed.list {
        let local = DateTime::from_timestamp(entry.dt + parsed.city.timezone, 0)
            .ok_or_else(|| anyhow!("OpenWeather returned an invalid timestamp {}", entry.dt))?;

        let high = entry.main.temp_max.unwrap_or(entry.main.temp);
        let low = entry.main.temp_min.unwrap_or(entry.main.temp);
        let wind = entry.wind.speed * MPS_TO_KMH;
        let rain = entry.rain.as_ref().map_or(0.0, |r| r.three_hours);

        let acc = by_date.entry(local.date_naive()).or_insert_with(|| DayAccumulator {
            max_c: f64::NEG_INFINITY,
            min_c: f64::INFINITY,
            ..DayAccumulator::default()
        });
        acc.max_c = acc.max_c.max(high);
        acc.min_c = acc.min_c.min(low);
        acc.precipitation_mm += rain;
        acc.wind_max_kmh = acc.wind_max_kmh.max(wind);
        acc.humidity_sum += entry.main.humidity;
        acc.samples += 1;
    }

    if by_date.is_empty() {
        return Err(SeriesError::Empty("OpenWeather forecast").into());
    }

    Ok(by_date
        .into_iter()
        .take(days as usize)
        .map(|(date, acc)| ForecastDay {
            date,
            max_c: acc.max_c,
            min_c: acc.min_c,
            precipitation_mm: acc.precipitation_mm,
            wind_speed_kmh: acc.wind_max_kmh,
            humidity_pct: Some(acc.humidity_sum / f64::from(acc.samples)),
        })
        .collect())
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, location: &Location) -> Result<CurrentConditions> {
        let body =
            self.get("https://api.openweathermap.org/data/2.5/weather", location, "current").await?;
        parse_current(&body, location)
    }

    async fn daily_forecast(&self, location: &Location, days: u32) -> Result<Vec<ForecastDay>> {
        if days == 0 || days > MAX_FORECAST_DAYS {
            bail!(
                "Requested {days} forecast days, but the free OpenWeather API covers 1..={MAX_FORECAST_DAYS}.\n\
                 Hint: use the openmeteo provider for forecasts up to 16 days."
            );
        }

        let body = self
            .get("https://api.openweathermap.org/data/2.5/forecast", location, "5-day forecast")
            .await?;
        parse_forecast(&body, days)
    }

    async fn hourly_forecast(&self, _location: &Location, _hours: u32) -> Result<Vec<HourlyReading>> {
        Err(anyhow!(
            "Hourly forecasts are not available from the free OpenWeather API, which only has 3-hour steps.\n\
             Hint: use the openmeteo provider for hourly data."
        ))
    }

    async fn history(
        &self,
        _location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalDay>> {
        Err(anyhow!(
            "Historical weather ({start}..{end}) is not supported by free OpenWeather API.\n\
             Only current weather and up to 5 days forecast are available."
        ))
    }
}
