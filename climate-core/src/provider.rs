use crate::{
    Config,
    model::{CurrentConditions, ForecastDay, HistoricalDay, HourlyReading, Location},
    provider::{openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};
use tokio::task::JoinSet;
use tracing::warn;

pub mod openmeteo;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenMeteo,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "openmeteo",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::OpenWeather]
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openmeteo" | "open-meteo" => Ok(ProviderId::OpenMeteo),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openmeteo, openweather."
            )),
        }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, location: &Location) -> anyhow::Result<CurrentConditions>;

    /// Daily forecast starting today, `days` entries long.
    async fn daily_forecast(
        &self,
        location: &Location,
        days: u32,
    ) -> anyhow::Result<Vec<ForecastDay>>;

    /// Short-term forecast, one entry per hour starting at local midnight.
    async fn hourly_forecast(
        &self,
        location: &Location,
        hours: u32,
    ) -> anyhow::Result<Vec<HourlyReading>>;

    /// Observed daily records for `start..=end`.
    async fn history(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<HistoricalDay>>;
}

/// Current conditions from a keyed provider when one is configured, falling
/// back to a second provider (Open-Meteo unless given). Forecasts and history
/// always come from the fallback.
#[derive(Debug)]
pub struct AggregateProvider {
    primary: Option<Box<dyn WeatherProvider>>,
    fallback: Box<dyn WeatherProvider>,
}

impl AggregateProvider {
    pub fn new(primary: Option<Box<dyn WeatherProvider>>) -> Self {
        Self::with_fallback(primary, Box::new(OpenMeteoProvider::new()))
    }

    pub fn with_fallback(
        primary: Option<Box<dyn WeatherProvider>>,
        fallback: Box<dyn WeatherProvider>,
    ) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl WeatherProvider for AggregateProvider {
    async fn current(&self, location: &Location) -> anyhow::Result<CurrentConditions> {
        if let Some(primary) = &self.primary {
            match primary.current(location).await {
                Ok(conditions) => return Ok(conditions),
                Err(err) => {
                    warn!(
                        location = %location.label(),
                        error = %format!("{err:#}"),
                        "primary provider failed, falling back"
                    );
                }
            }
        }

        self.fallback.current(location).await
    }

    async fn daily_forecast(
        &self,
        location: &Location,
        days: u32,
    ) -> anyhow::Result<Vec<ForecastDay>> {
        self.fallback.daily_forecast(location, days).await
    }

    async fn hourly_forecast(
        &self,
        location: &Location,
        hours: u32,
    ) -> anyhow::Result<Vec<HourlyReading>> {
        self.fallback.hourly_forecast(location, hours).await
    }

    async fn history(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<HistoricalDay>> {
        self.fallback.history(location, start, end).await
    }
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenMeteo => Box::new(OpenMeteoProvider::new()),
        ProviderId::OpenWeather => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for provider '{id}'.\n\
                         Hint: run `climate configure {id}` and enter your API key."
                )
            })?;
            Box::new(OpenWeatherProvider::new(api_key.to_owned()))
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
///
/// A keyed default is wrapped so that current conditions still work when
/// its API is unavailable.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    match id {
        ProviderId::OpenMeteo => provider_from_config(id, config),
        _ => Ok(Box::new(AggregateProvider::new(Some(provider_from_config(id, config)?)))),
    }
}

/// Current conditions for every location, fetched concurrently.
///
/// Results keep the order of `locations`; each entry fails independently.
pub async fn current_for_locations(
    provider: Arc<dyn WeatherProvider>,
    locations: &[Location],
) -> Vec<(Location, anyhow::Result<CurrentConditions>)> {
    let mut set = JoinSet::new();

    for (index, location) in locations.iter().cloned().enumerate() {
        let provider = Arc::clone(&provider);
        set.spawn(async move {
            let result = provider.current(&location).await;
            (index, location, result)
        });
    }

    let mut slots: Vec<Option<(Location, anyhow::Result<CurrentConditions>)>> =
        locations.iter().map(|_| None).collect();

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, location, result)) => slots[index] = Some((location, result)),
            Err(err) => warn!(error = %err, "current conditions task did not complete"),
        }
    }

    slots
        .into_iter()
        .zip(locations)
        .map(|(slot, location)| {
            slot.unwrap_or_else(|| {
                (location.clone(), Err(anyhow::anyhow!("Request for {} was aborted", location.label())))
            })
        })
        .collect()
}

/// Shortens an error body for inclusion in a message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
