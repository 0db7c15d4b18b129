use anyhow::{Result, anyhow};

use crate::model::Location;

/// (city, country, latitude, longitude)
const MONITORED: &[(&str, &str, f64, f64)] = &[
    ("Cairo", "Egypt", 30.0444, 31.2357),
    ("Lagos", "Nigeria", 6.5244, 3.3792),
    ("Nairobi", "Kenya", -1.2921, 36.8219),
    ("Johannesburg", "South Africa", -26.2023, 28.0436),
    ("Accra", "Ghana", 5.6037, -0.1870),
    ("Dakar", "Senegal", 14.7167, -17.4674),
    ("Khartoum", "Sudan", 15.5527, 32.5373),
    ("Addis Ababa", "Ethiopia", 9.0320, 38.7469),
];

/// The fixed set of monitored locations.
pub fn all() -> Vec<Location> {
    MONITORED
        .iter()
        .map(|(name, country, latitude, longitude)| Location {
            name: (*name).to_string(),
            country: (*country).to_string(),
            latitude: *latitude,
            longitude: *longitude,
        })
        .collect()
}

/// Resolves a user-supplied location: a monitored city name (optionally as
/// "City, Country") or a `lat,lon` pair.
pub fn resolve(query: &str) -> Result<Location> {
    let query = query.trim();

    if let Some(location) = parse_coordinates(query)? {
        return Ok(location);
    }

    let wanted = query.to_lowercase();
    let city = wanted.split(',').next().unwrap_or_default().trim();

    all()
        .into_iter()
        .find(|loc| loc.name.to_lowercase() == city || loc.label().to_lowercase() == wanted)
        .ok_or_else(|| {
            let known: Vec<&str> = MONITORED.iter().map(|(name, ..)| *name).collect();
            anyhow!(
                "Unknown location '{query}'. Known locations: {}.\n\
                 Hint: coordinates are also accepted as `lat,lon`, e.g. `30.04,31.24`.",
                known.join(", ")
            )
        })
}

fn parse_coordinates(query: &str) -> Result<Option<Location>> {
    let Some((lat, lon)) = query.split_once(',') else {
        return Ok(None);
    };

    let (Ok(latitude), Ok(longitude)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>())
    else {
        return Ok(None);
    };

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(anyhow!(
            "Coordinates out of range: latitude must be within [-90, 90] and longitude within [-180, 180], got {latitude},{longitude}."
        ));
    }

    Ok(Some(Location {
        name: format!("{latitude:.4},{longitude:.4}"),
        country: String::new(),
        latitude,
        longitude,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_eight_locations() {
        assert_eq!(all().len(), 8);
    }

    #[test]
    fn resolves_city_case_insensitively() {
        let loc = resolve("nairobi").expect("Nairobi is monitored");
        assert_eq!(loc.country, "Kenya");

        let loc = resolve("Addis Ababa, Ethiopia").expect("full label resolves");
        assert_eq!(loc.name, "Addis Ababa");
    }

    #[test]
    fn resolves_coordinates() {
        let loc = resolve(" 12.5, -8.0 ").expect("coordinates resolve");
        assert_eq!(loc.latitude, 12.5);
        assert_eq!(loc.longitude, -8.0);
        assert_eq!(loc.label(), "12.5000,-8.0000");
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = resolve("95,10").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn unknown_city_lists_known_names() {
        let err = resolve("Atlantis").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown location"));
        assert!(msg.contains("Khartoum"));
    }
}
