use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ChartError;
use crate::time::parse_timezone;

/// Coordinates within this many degrees of a gazetteer entry share its timezone.
const TIMEZONE_MATCH_DEGREES: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinates {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("no match")]
    NotFound,
    #[error("{0}")]
    Service(String),
}

/// Turns free-text place names into coordinates and coordinates into IANA timezones.
pub trait LocationResolver {
    fn resolve(&self, place: &str) -> Result<Coordinates, LocationError>;

    fn timezone_at(&self, latitude: f64, longitude: f64) -> Result<String, LocationError>;
}

impl<R: LocationResolver + ?Sized> LocationResolver for &R {
    fn resolve(&self, place: &str) -> Result<Coordinates, LocationError> {
        (**self).resolve(place)
    }

    fn timezone_at(&self, latitude: f64, longitude: f64) -> Result<String, LocationError> {
        (**self).timezone_at(latitude, longitude)
    }
}

/// A place fully resolved for chart computation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Tz,
}

pub fn resolve_location<R: LocationResolver + ?Sized>(
    resolver: &R,
    place: &str,
) -> Result<ResolvedLocation, ChartError> {
    let coordinates = resolver.resolve(place).map_err(|e| match e {
        LocationError::NotFound => ChartError::LocationNotFound(place.to_string()),
        LocationError::Service(msg) => ChartError::LocationServiceFailure(msg),
    })?;

    let timezone_missing = || ChartError::TimezoneNotFound {
        place: place.to_string(),
        latitude: coordinates.latitude,
        longitude: coordinates.longitude,
    };

    let timezone_id = resolver
        .timezone_at(coordinates.latitude, coordinates.longitude)
        .map_err(|e| match e {
            LocationError::NotFound => timezone_missing(),
            LocationError::Service(msg) => ChartError::LocationServiceFailure(msg),
        })?;
    let timezone = parse_timezone(&timezone_id).ok_or_else(timezone_missing)?;

    Ok(ResolvedLocation {
        latitude: coordinates.latitude,
        longitude: coordinates.longitude,
        timezone,
    })
}

// ---------------------------
// ## Gazetteer
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazetteerEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl GazetteerEntry {
    pub fn new(name: &str, latitude: f64, longitude: f64, timezone: &str) -> Self {
        GazetteerEntry {
            name: name.to_string(),
            aliases: Vec::new(),
            latitude,
            longitude,
            timezone: timezone.to_string(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_string()));
        self
    }

    fn matches(&self, key: &str) -> bool {
        place_key(&self.name) == key || self.aliases.iter().any(|a| place_key(a) == key)
    }
}

const BUILTIN_PLACES: &[(&str, &[&str], f64, f64, &str)] = &[
    ("Austin, TX", &["Austin", "Austin, Texas"], 30.2672, -97.7431, "America/Chicago"),
    ("Chicago, IL", &["Chicago", "Chicago, Illinois"], 41.8781, -87.6298, "America/Chicago"),
    ("Lexington, KY", &["Lexington, Kentucky"], 38.0406, -84.5037, "America/New_York"),
    ("New York, NY", &["New York", "New York City", "NYC"], 40.7128, -74.0060, "America/New_York"),
    ("Los Angeles, CA", &["Los Angeles", "LA"], 34.0522, -118.2437, "America/Los_Angeles"),
    ("London, UK", &["London", "London, England"], 51.5074, -0.1278, "Europe/London"),
    ("Paris, France", &["Paris"], 48.8566, 2.3522, "Europe/Paris"),
    ("Berlin, Germany", &["Berlin"], 52.5200, 13.4050, "Europe/Berlin"),
    ("Tokyo, Japan", &["Tokyo"], 35.6762, 139.6503, "Asia/Tokyo"),
    ("Sydney, Australia", &["Sydney"], -33.8688, 151.2093, "Australia/Sydney"),
    ("Delhi, India", &["Delhi", "New Delhi"], 28.6139, 77.2090, "Asia/Kolkata"),
    ("Mumbai, India", &["Mumbai", "Bombay"], 19.0760, 72.8777, "Asia/Kolkata"),
    ("Kozhikode, India", &["Kozhikode", "Calicut"], 11.2588, 75.7804, "Asia/Kolkata"),
    ("Dubai, UAE", &["Dubai"], 25.276987, 55.296234, "Asia/Dubai"),
];

/// Offline resolver backed by a fixed list of places.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    entries: Vec<GazetteerEntry>,
}

impl Gazetteer {
    pub fn empty() -> Self {
        Gazetteer::default()
    }

    /// A gazetteer preloaded with a handful of common birth cities.
    pub fn builtin() -> Self {
        let entries = BUILTIN_PLACES
            .iter()
            .map(|(name, aliases, lat, lon, tz)| {
                GazetteerEntry::new(name, *lat, *lon, tz).with_aliases(aliases)
            })
            .collect();
        Gazetteer { entries }
    }

    pub fn with_entries(mut self, entries: impl IntoIterator<Item = GazetteerEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    pub fn add(&mut self, entry: GazetteerEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, place: &str) -> Option<&GazetteerEntry> {
        let key = place_key(place);
        if key.is_empty() {
            return None;
        }
        // later entries (configured places) override built-in ones
        self.entries.iter().rev().find(|entry| entry.matches(&key))
    }
}

impl LocationResolver for Gazetteer {
    fn resolve(&self, place: &str) -> Result<Coordinates, LocationError> {
        self.find(place)
            .map(|entry| Coordinates::new(entry.latitude, entry.longitude))
            .ok_or(LocationError::NotFound)
    }

    fn timezone_at(&self, latitude: f64, longitude: f64) -> Result<String, LocationError> {
        self.entries
            .iter()
            .map(|entry| {
                let distance = (entry.latitude - latitude)
                    .abs()
                    .max((entry.longitude - longitude).abs());
                (distance, entry)
            })
            .filter(|(distance, _)| *distance <= TIMEZONE_MATCH_DEGREES)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, entry)| entry.timezone.clone())
            .ok_or(LocationError::NotFound)
    }
}

/// Tries `primary` first and consults `secondary` only when the primary has no match.
#[derive(Debug, Clone)]
pub struct Fallback<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A, B> Fallback<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Fallback { primary, secondary }
    }
}

impl<A: LocationResolver, B: LocationResolver> LocationResolver for Fallback<A, B> {
    fn resolve(&self, place: &str) -> Result<Coordinates, LocationError> {
        match self.primary.resolve(place) {
            Err(LocationError::NotFound) => self.secondary.resolve(place),
            other => other,
        }
    }

    fn timezone_at(&self, latitude: f64, longitude: f64) -> Result<String, LocationError> {
        match self.primary.timezone_at(latitude, longitude) {
            Err(LocationError::NotFound) => self.secondary.timezone_at(latitude, longitude),
            other => other,
        }
    }
}

/// Case-folded place name with whitespace collapsed and comma spacing normalized.
fn place_key(place: &str) -> String {
    place
        .split(',')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_is_forgiving() {
        let gazetteer = Gazetteer::builtin();
        let austin = gazetteer.resolve("  austin ,  tx ").unwrap();
        assert_eq!(austin, Coordinates::new(30.2672, -97.7431));
        assert!(gazetteer.resolve("Calicut").is_ok());
        assert_eq!(
            gazetteer.resolve("Nonexistent Place Zzzzz"),
            Err(LocationError::NotFound)
        );
        assert_eq!(gazetteer.resolve(" , "), Err(LocationError::NotFound));
    }

    #[test]
    fn test_timezone_by_proximity() {
        let gazetteer = Gazetteer::builtin();
        assert_eq!(gazetteer.timezone_at(30.3, -97.7).unwrap(), "America/Chicago");
        assert_eq!(gazetteer.timezone_at(0.0, -160.0), Err(LocationError::NotFound));
    }

    #[test]
    fn test_configured_entries_override_builtin() {
        let gazetteer = Gazetteer::builtin().with_entries([GazetteerEntry::new(
            "Paris, TX",
            33.6609,
            -95.5555,
            "America/Chicago",
        )
        .with_aliases(&["Paris"])]);
        let paris = gazetteer.resolve("paris").unwrap();
        assert_eq!(paris.latitude, 33.6609);
    }

    #[test]
    fn test_resolve_location_maps_errors() {
        let mut gazetteer = Gazetteer::empty();
        gazetteer.add(GazetteerEntry::new("Atlantis", 10.0, -30.0, "Atlantis/Capital"));

        let err = resolve_location(&gazetteer, "Nowhere").unwrap_err();
        assert_eq!(err, ChartError::LocationNotFound("Nowhere".into()));

        let err = resolve_location(&gazetteer, "Atlantis").unwrap_err();
        assert!(matches!(err, ChartError::TimezoneNotFound { .. }));
    }

    struct Offline;

    impl LocationResolver for Offline {
        fn resolve(&self, _place: &str) -> Result<Coordinates, LocationError> {
            Err(LocationError::Service("connection refused".into()))
        }

        fn timezone_at(&self, _lat: f64, _lon: f64) -> Result<String, LocationError> {
            Err(LocationError::Service("connection refused".into()))
        }
    }

    #[test]
    fn test_fallback_only_on_not_found() {
        let chain = Fallback::new(Gazetteer::builtin(), Offline);
        assert!(chain.resolve("Tokyo").is_ok());
        assert_eq!(
            chain.resolve("Reykjavik"),
            Err(LocationError::Service("connection refused".into()))
        );

        let err = resolve_location(&chain, "Reykjavik").unwrap_err();
        assert_eq!(
            err,
            ChartError::LocationServiceFailure("connection refused".into())
        );
    }
}
