use serde::{Deserialize, Serialize};

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Apparent temperature in °C from air temperature and relative humidity.
///
/// Rothfusz regression evaluated in °F. Only meaningful above roughly
/// 27 °C / 80 °F; outside that range it still returns a number, but not a
/// useful one.
pub fn heat_index(temperature_c: f64, relative_humidity_pct: f64) -> f64 {
    const C1: f64 = -42.379;
    const C2: f64 = 2.049_015_23;
    const C3: f64 = 10.143_331_27;
    const C4: f64 = -0.224_755_41;
    const C5: f64 = -0.006_837_83;
    const C6: f64 = -0.054_817_17;
    const C7: f64 = 0.001_228_74;
    const C8: f64 = 0.000_852_82;
    const C9: f64 = -0.000_001_99;

    let t = celsius_to_fahrenheit(temperature_c);
    let rh = relative_humidity_pct;

    let hi = C1
        + C2 * t
        + C3 * rh
        + C4 * t * rh
        + C5 * t * t
        + C6 * rh * rh
        + C7 * t * t * rh
        + C8 * t * rh * rh
        + C9 * t * t * rh * rh;

    fahrenheit_to_celsius(hi)
}

/// Air temperature below which `heat_index` is not reported.
pub const HEAT_INDEX_MIN_C: f64 = 27.0;

/// `heat_index` for readings warm enough for the regression to apply.
pub fn applicable_heat_index(temperature_c: f64, relative_humidity_pct: f64) -> Option<f64> {
    (temperature_c >= HEAT_INDEX_MIN_C).then(|| heat_index(temperature_c, relative_humidity_pct))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn convert_from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
        }
    }

    /// Formats a °C value in this unit, rounded to one decimal.
    pub fn format(self, celsius: f64) -> String {
        let value = (self.convert_from_celsius(celsius) * 10.0).round() / 10.0;
        format!("{value}{}", self.symbol())
    }

    /// Formats a temperature difference given in °C; no offset is applied.
    pub fn format_delta(self, celsius_delta: f64) -> String {
        let value = match self {
            TemperatureUnit::Celsius => celsius_delta,
            TemperatureUnit::Fahrenheit => celsius_delta * 9.0 / 5.0,
        };
        format!("{}{}", (value * 10.0).round() / 10.0, self.symbol())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!("Unknown temperature unit '{value}'. Use 'c' or 'f'.")),
        }
    }
}

/// Plain-language label for a wind speed in km/h.
pub fn wind_description(speed_kmh: f64) -> &'static str {
    match speed_kmh {
        s if s < 2.0 => "Calm",
        s if s < 6.0 => "Light breeze",
        s if s < 12.0 => "Moderate breeze",
        s if s < 20.0 => "Fresh breeze",
        s if s < 29.0 => "Strong breeze",
        s if s < 39.0 => "Gale",
        s if s < 47.0 => "Severe gale",
        _ => "Hurricane",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.05
    }

    #[test]
    fn conversions() {
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
        assert_eq!(fahrenheit_to_celsius(32.0), 0.0);
        assert!(close(fahrenheit_to_celsius(celsius_to_fahrenheit(36.6)), 36.6));
    }

    #[test]
    fn heat_index_matches_reference_table() {
        // NWS table: 90 °F at 50 % RH feels like about 95 °F
        let hi_f = celsius_to_fahrenheit(heat_index(fahrenheit_to_celsius(90.0), 50.0));
        assert!((hi_f - 94.6).abs() < 1.0, "got {hi_f}");

        // humid heat is worse than dry heat
        assert!(heat_index(35.0, 80.0) > heat_index(35.0, 40.0));
    }

    #[test]
    fn heat_index_never_fails_on_odd_input() {
        assert!(heat_index(-30.0, 150.0).is_finite());
    }

    #[test]
    fn heat_index_is_withheld_for_cool_air() {
        assert_eq!(applicable_heat_index(10.0, 50.0), None);
        assert_eq!(applicable_heat_index(26.9, 90.0), None);
        assert_eq!(applicable_heat_index(32.0, 60.0), Some(heat_index(32.0, 60.0)));
        assert!(applicable_heat_index(HEAT_INDEX_MIN_C, 50.0).is_some());
    }

    #[test]
    fn format_rounds_to_one_decimal() {
        assert_eq!(TemperatureUnit::Celsius.format(36.56), "36.6°C");
        assert_eq!(TemperatureUnit::Fahrenheit.format(35.0), "95°F");
        assert_eq!(TemperatureUnit::Fahrenheit.format_delta(5.0), "9°F");
        assert_eq!(TemperatureUnit::Celsius.format_delta(6.25), "6.3°C");
    }

    #[test]
    fn unit_parsing() {
        assert_eq!(TemperatureUnit::try_from("F").unwrap(), TemperatureUnit::Fahrenheit);
        assert!(TemperatureUnit::try_from("kelvin").is_err());
    }

    #[test]
    fn wind_labels() {
        assert_eq!(wind_description(0.0), "Calm");
        assert_eq!(wind_description(11.9), "Moderate breeze");
        assert_eq!(wind_description(20.0), "Strong breeze");
        assert_eq!(wind_description(120.0), "Hurricane");
    }
}
