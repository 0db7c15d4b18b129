//! Human-readable output.

use anyhow::{Context, Result};
use climate_core::{
    AlertSeverity, AnomalyRecord, CurrentConditions, ForecastDay, HistoricalDay, HourlyReading,
    Location, TemperatureUnit, Thresholds, WaveAlert, WaveKind, applicable_heat_index,
    units::wind_description,
};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")?;
    println!("{text}");
    Ok(())
}

/// Joins rendered rows, each terminated by a newline.
fn lines(rows: impl IntoIterator<Item = String>) -> String {
    rows.into_iter().map(|row| row + "\n").collect()
}

/// Heat or cold tier for a single current reading, if it crosses a threshold.
pub fn instant_alert(
    temperature_c: f64,
    thresholds: &Thresholds,
) -> Option<(WaveKind, AlertSeverity)> {
    if temperature_c >= thresholds.heat_wave_c {
        Some((WaveKind::HeatWave, WaveKind::HeatWave.severity(temperature_c)))
    } else if temperature_c <= thresholds.cold_wave_c {
        Some((WaveKind::ColdWave, WaveKind::ColdWave.severity(temperature_c)))
    } else {
        None
    }
}

pub fn locations(all: &[Location]) -> String {
    lines(all.iter().map(|loc| {
        format!("{:<28} {:>9.4} {:>9.4}", loc.label(), loc.latitude, loc.longitude)
    }))
}

pub fn current(
    current: &CurrentConditions,
    alert: Option<(WaveKind, AlertSeverity)>,
    unit: TemperatureUnit,
) -> String {
    let mut rows = vec![
        format!("{} ({})", current.location, current.provider),
        format!("  Observed:    {}", current.observation_time.format("%Y-%m-%d %H:%M UTC")),
        format!("  Conditions:  {}", current.description),
        format!(
            "  Temperature: {} (feels like {})",
            unit.format(current.temperature_c),
            unit.format(current.feels_like_c)
        ),
    ];
    if let Some(hi) = applicable_heat_index(current.temperature_c, current.humidity_pct) {
        rows.push(format!("  Heat index:  {}", unit.format(hi)));
    }
    rows.push(format!("  Humidity:    {:.0}%", current.humidity_pct));
    rows.push(format!(
        "  Wind:        {:.1} km/h ({})",
        current.wind_speed_kmh,
        wind_description(current.wind_speed_kmh)
    ));
    if let Some((kind, severity)) = alert {
        rows.push(format!("  Alert:       {kind} conditions, {severity}"));
    }
    lines(rows)
}

/// One row per location. The "feels" column is the heat index in hot air
/// and the provider's apparent temperature otherwise.
pub fn overview(
    results: &[(Location, Result<CurrentConditions>)],
    thresholds: &Thresholds,
    unit: TemperatureUnit,
) -> String {
    lines(results.iter().map(|(location, result)| match result {
        Ok(current) => {
            let alert = instant_alert(current.temperature_c, thresholds)
                .map(|(kind, severity)| format!("  [{kind}: {severity}]"))
                .unwrap_or_default();
            let feels = applicable_heat_index(current.temperature_c, current.humidity_pct)
                .unwrap_or(current.feels_like_c);
            format!(
                "{:<28} {:>8}  feels {:>8}  {:>3.0}%  {}{}",
                location.label(),
                unit.format(current.temperature_c),
                unit.format(feels),
                current.humidity_pct,
                current.description,
                alert
            )
        }
        Err(err) => format!("{:<28} unavailable: {err:#}", location.label()),
    }))
}

pub fn forecast(days: &[ForecastDay], unit: TemperatureUnit) -> String {
    let header = format!("{:<10}  {:>8}  {:>8}  {:>7}  wind", "date", "high", "low", "rain");
    let rows = days.iter().map(|day| {
        format!(
            "{:<10}  {:>8}  {:>8}  {:>5.1}mm  {:.0} km/h ({})",
            day.date,
            unit.format(day.max_c),
            unit.format(day.min_c),
            day.precipitation_mm,
            day.wind_speed_kmh,
            wind_description(day.wind_speed_kmh)
        )
    });
    lines(std::iter::once(header).chain(rows))
}

pub fn hourly(hours: &[HourlyReading], unit: TemperatureUnit) -> String {
    let header = format!("{:<16}  {:>8}  {:>8}  {:>7}  wind", "time", "temp", "humidity", "rain");
    let rows = hours.iter().map(|hour| {
        format!(
            "{:<16}  {:>8}  {:>7.0}%  {:>5.1}mm  {:.0} km/h",
            hour.time.format("%Y-%m-%d %H:%M"),
            unit.format(hour.temperature_c),
            hour.humidity_pct,
            hour.precipitation_mm,
            hour.wind_speed_kmh
        )
    });
    lines(std::iter::once(header).chain(rows))
}

pub fn history(days: &[HistoricalDay], unit: TemperatureUnit) -> String {
    let header = format!("{:<10}  {:>8}  {:>8}  {:>8}  {:>7}", "date", "high", "low", "mean", "rain");
    let rows = days.iter().map(|day| {
        format!(
            "{:<10}  {:>8}  {:>8}  {:>8}  {:>5.1}mm",
            day.date,
            unit.format(day.max_c),
            unit.format(day.min_c),
            unit.format(day.mean_reading().temperature),
            day.precipitation_mm
        )
    });
    lines(std::iter::once(header).chain(rows))
}

pub fn alerts(alerts: &[WaveAlert], unit: TemperatureUnit) -> String {
    if alerts.is_empty() {
        return "No heat or cold waves detected.\n".to_string();
    }

    lines(alerts.iter().map(|alert| {
        let peak = match alert.kind {
            WaveKind::HeatWave => "peak",
            WaveKind::ColdWave => "low",
        };
        format!(
            "{:<9} {:<8} {} .. {}  {} days, {} {}",
            alert.kind,
            alert.severity,
            alert.event.start_date,
            alert.event.end_date,
            alert.event.duration_days,
            peak,
            unit.format(alert.event.extreme_temperature)
        )
    }))
}

pub fn anomalies(records: &[AnomalyRecord], unit: TemperatureUnit) -> String {
    if records.is_empty() {
        return "No temperature anomalies detected.\n".to_string();
    }

    lines(records.iter().map(|r| {
        format!(
            "{}  {:<12} {:<8}  {} vs baseline {} ({})",
            r.date,
            r.kind,
            r.severity,
            unit.format(r.observed_temperature),
            unit.format(r.baseline_temperature),
            unit.format_delta(r.absolute_difference)
        )
    }))
}
