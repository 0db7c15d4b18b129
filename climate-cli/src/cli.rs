use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow};
use chrono::{Months, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use climate_core::{
    Config, CurrentConditions, Location, ProviderId, TemperatureUnit, Thresholds, WeatherProvider,
    applicable_heat_index, compare_to_baseline, locations,
    provider::{current_for_locations, default_provider_from_config, openmeteo},
    series::load_readings,
    units::wind_description,
    waves::{scan_forecast, scan_series},
};
use inquire::{Confirm, Password};
use tracing::info;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climate", version, about = "Heat wave, cold wave and anomaly alerts for African cities")]
pub struct Cli {
    /// Display unit for temperatures: c or f.
    #[arg(long, global = true, default_value = "c", value_parser = parse_unit)]
    pub unit: TemperatureUnit,

    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

fn parse_unit(value: &str) -> Result<TemperatureUnit, String> {
    TemperatureUnit::try_from(value).map_err(|e| e.to_string())
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openmeteo" or "openweather".
        provider: String,
    },

    /// List monitored locations.
    Locations,

    /// Current conditions and heat index for a location.
    Now {
        /// City name or `lat,lon`; defaults to `default_location` from config.
        location: Option<String>,
    },

    /// Current conditions for every monitored location.
    Overview {
        /// Order by current temperature instead of catalogue order.
        #[arg(long, value_enum)]
        sort: Option<Ranking>,

        /// Show at most this many locations.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Daily forecast for a location.
    Forecast {
        location: Option<String>,

        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Hour-by-hour forecast for a location.
    Hourly {
        location: Option<String>,

        #[arg(long, default_value_t = 24)]
        hours: u32,
    },

    /// Observed daily records from the archive.
    History {
        location: Option<String>,

        /// First day, YYYY-MM-DD.
        #[arg(long)]
        from: NaiveDate,

        /// Last day, YYYY-MM-DD (inclusive).
        #[arg(long)]
        to: NaiveDate,
    },

    /// Heat and cold wave alerts over the forecast.
    Alerts {
        location: Option<String>,

        #[arg(long, default_value_t = openmeteo::MAX_FORECAST_DAYS)]
        days: u32,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Forecast daily means compared with the same days one year earlier.
    Anomalies {
        location: Option<String>,

        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Deviation in °C above which a day is flagged.
        #[arg(long)]
        deviation: Option<f64>,
    },

    /// Detect waves in a local JSON file of `{date, temperature}` readings.
    Analyze {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = WaveSelection::Both)]
        direction: WaveSelection,

        #[command(flatten)]
        thresholds: ThresholdArgs,

        /// Baseline readings to compare against for anomalies.
        #[arg(long)]
        baseline: Option<PathBuf>,

        #[arg(long)]
        deviation: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Ranking {
    Hottest,
    Coldest,
}

/// Orders overview results by temperature and applies `limit`.
///
/// Locations that failed to load sort after every successful one.
fn rank(
    mut results: Vec<(Location, Result<CurrentConditions>)>,
    ranking: Option<Ranking>,
    limit: Option<usize>,
) -> Vec<(Location, Result<CurrentConditions>)> {
    if let Some(ranking) = ranking {
        results.sort_by(|(_, a), (_, b)| match (a, b) {
            (Ok(a), Ok(b)) => match ranking {
                Ranking::Hottest => b.temperature_c.total_cmp(&a.temperature_c),
                Ranking::Coldest => a.temperature_c.total_cmp(&b.temperature_c),
            },
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });
    }
    if let Some(limit) = limit {
        results.truncate(limit);
    }
    results
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WaveSelection {
    Heat,
    Cold,
    Both,
}

/// Per-invocation overrides of the configured thresholds.
#[derive(Debug, Clone, Default, Args)]
pub struct ThresholdArgs {
    /// Heat wave threshold in °C (at or above).
    #[arg(long)]
    pub heat_threshold: Option<f64>,

    /// Cold wave threshold in °C (at or below).
    #[arg(long)]
    pub cold_threshold: Option<f64>,

    /// Minimum number of consecutive days.
    #[arg(long)]
    pub min_run: Option<usize>,
}

impl ThresholdArgs {
    pub fn apply(&self, base: Thresholds) -> Result<Thresholds> {
        let merged = Thresholds {
            heat_wave_c: self.heat_threshold.unwrap_or(base.heat_wave_c),
            cold_wave_c: self.cold_threshold.unwrap_or(base.cold_wave_c),
            minimum_run_days: self.min_run.unwrap_or(base.minimum_run_days),
            ..base
        };
        merged.validate()?;
        Ok(merged)
    }
}

fn with_deviation(base: Thresholds, deviation: Option<f64>) -> Result<Thresholds> {
    let merged = Thresholds {
        anomaly_deviation_c: deviation.unwrap_or(base.anomaly_deviation_c),
        ..base
    };
    merged.validate()?;
    Ok(merged)
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        let unit = self.unit;
        let json = self.json;

        match self.command {
            Command::Configure { provider } => configure(&mut config, &provider)?,

            Command::Locations => {
                let all = locations::all();
                if json {
                    render::print_json(&all)?;
                } else {
                    print!("{}", render::locations(&all));
                }
            }

            Command::Now { location } => {
                let location = locations::resolve(config.location_or_default(location.as_deref())?)?;
                let provider = default_provider_from_config(&config)?;
                let current = provider.current(&location).await?;

                let alert = render::instant_alert(current.temperature_c, &config.thresholds);

                if json {
                    render::print_json(&serde_json::json!({
                        "current": current,
                        "heat_index_c": applicable_heat_index(current.temperature_c, current.humidity_pct),
                        "wind": wind_description(current.wind_speed_kmh),
                        "alert": alert.map(|(kind, severity)| serde_json::json!({
                            "kind": kind,
                            "severity": severity,
                        })),
                    }))?;
                } else {
                    print!("{}", render::current(&current, alert, unit));
                }
            }

            Command::Overview { sort, limit } => {
                let provider: Arc<dyn WeatherProvider> = Arc::from(default_provider_from_config(&config)?);
                let results = current_for_locations(provider, &locations::all()).await;
                let results = rank(results, sort, limit);

                if json {
                    let entries: Vec<serde_json::Value> = results
                        .iter()
                        .map(|(location, result)| match result {
                            Ok(current) => serde_json::json!({
                                "location": location,
                                "current": current,
                                "heat_index_c": applicable_heat_index(current.temperature_c, current.humidity_pct),
                            }),
                            Err(err) => serde_json::json!({
                                "location": location,
                                "error": format!("{err:#}"),
                            }),
                        })
                        .collect();
                    render::print_json(&entries)?;
                } else {
                    print!("{}", render::overview(&results, &config.thresholds, unit));
                }
            }

            Command::Forecast { location, days } => {
                let location = locations::resolve(config.location_or_default(location.as_deref())?)?;
                let provider = default_provider_from_config(&config)?;
                let forecast = provider.daily_forecast(&location, days).await?;

                if json {
                    render::print_json(&forecast)?;
                } else {
                    println!("{}: {} day forecast", location.label(), forecast.len());
                    print!("{}", render::forecast(&forecast, unit));
                }
            }

            Command::Hourly { location, hours } => {
                let location = locations::resolve(config.location_or_default(location.as_deref())?)?;
                let provider = default_provider_from_config(&config)?;
                let hourly = provider.hourly_forecast(&location, hours).await?;

                if json {
                    render::print_json(&hourly)?;
                } else {
                    println!("{}: next {} hours (local time)", location.label(), hourly.len());
                    print!("{}", render::hourly(&hourly, unit));
                }
            }

            Command::History { location, from, to } => {
                let location = locations::resolve(config.location_or_default(location.as_deref())?)?;
                let provider = default_provider_from_config(&config)?;
                let history = provider.history(&location, from, to).await?;

                if json {
                    render::print_json(&history)?;
                } else {
                    println!("{}: observed {}..{}", location.label(), from, to);
                    print!("{}", render::history(&history, unit));
                }
            }

            Command::Alerts { location, days, thresholds } => {
                let thresholds = thresholds.apply(config.thresholds)?;
                let location = locations::resolve(config.location_or_default(location.as_deref())?)?;
                let provider = default_provider_from_config(&config)?;
                let forecast = provider.daily_forecast(&location, days).await?;

                let alerts = scan_forecast(
                    &forecast,
                    thresholds.heat_criteria(),
                    thresholds.cold_criteria(),
                )
                .context("Forecast data could not be scanned for waves")?;
                info!(location = %location.label(), count = alerts.len(), "wave scan finished");

                if json {
                    render::print_json(&alerts)?;
                } else {
                    println!("{}: next {} days", location.label(), forecast.len());
                    print!("{}", render::alerts(&alerts, unit));
                }
            }

            Command::Anomalies { location, days, deviation } => {
                let thresholds = with_deviation(config.thresholds, deviation)?;
                let location = locations::resolve(config.location_or_default(location.as_deref())?)?;
                let provider = default_provider_from_config(&config)?;

                let forecast = provider.daily_forecast(&location, days).await?;
                let (first, last) = match (forecast.first(), forecast.last()) {
                    (Some(first), Some(last)) => (first.date, last.date),
                    _ => return Err(anyhow!("No forecast data returned for {}", location.label())),
                };
                let year = Months::new(12);
                let start = first
                    .checked_sub_months(year)
                    .ok_or_else(|| anyhow!("Cannot compute baseline start for {first}"))?;
                let end = last
                    .checked_sub_months(year)
                    .ok_or_else(|| anyhow!("Cannot compute baseline end for {last}"))?;

                let history = provider.history(&location, start, end).await?;

                let current: Vec<_> = forecast.iter().map(|d| d.mean_reading()).collect();
                let baseline: Vec<_> = history.iter().map(|d| d.mean_reading()).collect();
                let records =
                    compare_to_baseline(&current, &baseline, thresholds.anomaly_deviation_c)
                        .context("Forecast and baseline could not be compared")?;

                if json {
                    render::print_json(&records)?;
                } else {
                    println!(
                        "{}: forecast vs {}..{} (deviation > {})",
                        location.label(),
                        start,
                        end,
                        unit.format_delta(thresholds.anomaly_deviation_c),
                    );
                    print!("{}", render::anomalies(&records, unit));
                }
            }

            Command::Analyze { file, direction, thresholds, baseline, deviation } => {
                let thresholds = with_deviation(thresholds.apply(config.thresholds)?, deviation)?;
                let readings = load_readings(&file)?;

                let heat = matches!(direction, WaveSelection::Heat | WaveSelection::Both)
                    .then(|| thresholds.heat_criteria());
                let cold = matches!(direction, WaveSelection::Cold | WaveSelection::Both)
                    .then(|| thresholds.cold_criteria());

                let alerts = scan_series(&readings, heat, cold)
                    .with_context(|| format!("Invalid readings in {}", file.display()))?;

                let records = match &baseline {
                    Some(path) => {
                        let reference = load_readings(path)?;
                        Some(
                            compare_to_baseline(&readings, &reference, thresholds.anomaly_deviation_c)
                                .with_context(|| {
                                    format!("Could not compare against {}", path.display())
                                })?,
                        )
                    }
                    None => None,
                };

                if json {
                    render::print_json(&serde_json::json!({
                        "waves": alerts,
                        "anomalies": records,
                    }))?;
                } else {
                    println!("{}: {} readings", file.display(), readings.len());
                    print!("{}", render::alerts(&alerts, unit));
                    if let Some(records) = &records {
                        print!("{}", render::anomalies(records, unit));
                    }
                }
            }
        }

        Ok(())
    }
}

fn configure(config: &mut Config, provider: &str) -> Result<()> {
    let id = ProviderId::try_from(provider)?;

    if !id.requires_api_key() {
        config.set_default_provider(id);
        config.save()?;
        println!("{id} needs no API key; it is now the default provider.");
        return Ok(());
    }

    let api_key = Password::new(&format!("{id} API key:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    let previous_default = match config.default_provider {
        Some(_) => Some(config.default_provider_id()?),
        None => None,
    };
    config.upsert_provider_api_key(id, api_key);

    if let Some(previous) = previous_default.filter(|previous| *previous != id) {
        let make_default =
            Confirm::new(&format!("Make {id} the default provider instead of {previous}?"))
                .with_default(true)
                .prompt()
                .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!(
        "Saved {id} credentials to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}
