use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::model::DailyReading;

/// Reads a JSON array of `{"date": "YYYY-MM-DD", "temperature": <°C>}`.
pub fn load_readings(path: &Path) -> Result<Vec<DailyReading>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read readings file: {}", path.display()))?;

    parse_readings(&contents)
        .with_context(|| format!("Failed to parse readings file: {}", path.display()))
}

pub fn parse_readings(json: &str) -> Result<Vec<DailyReading>> {
    let readings: Vec<DailyReading> = serde_json::from_str(json)?;
    Ok(readings)
}
