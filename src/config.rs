//! Layered settings for the chart engine.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `NATAL` using `__` between nested keys:
//!
//! - `NATAL__CHART__HOUSE_SYSTEM=koch` -> `chart.house_system = "koch"`
//! - `NATAL__TRANSIT__FRAME=natal` -> `transit.frame = "natal"`
//! - `NATAL__GEOCODER__TIMEOUT_SECS=5` -> `geocoder.timeout_secs = 5`

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::aspects::AspectTable;
use crate::chart::ChartOptions;
use crate::location::{Gazetteer, GazetteerEntry};
use crate::time::{parse_timezone, TIME_FORMAT};
use crate::transits::TransitFrame;

pub const ENV_PREFIX: &str = "NATAL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Options applied when a request does not name its own.
    pub chart: ChartOptions,
    pub aspects: AspectSettings,
    pub transit: TransitSettings,
    pub ephemeris: EphemerisSettings,
    pub geocoder: GeocoderSettings,
    /// Extra gazetteer entries, consulted before the built-in places.
    pub places: Vec<GazetteerEntry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AspectSettings {
    pub natal: AspectTable,
    pub transit: AspectTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitSettings {
    /// Wall-clock time used when a transit request carries only a date.
    pub default_time: String,
    pub frame: TransitFrame,
}

impl Default for TransitSettings {
    fn default() -> Self {
        TransitSettings {
            default_time: "12:00".to_string(),
            frame: TransitFrame::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EphemerisSettings {
    /// Directory holding Swiss Ephemeris `.se1` files. Unset uses the built-in Moshier theory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderSettings {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        GeocoderSettings {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: concat!("natal_core/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Loads settings from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, table) in [("natal", &self.aspects.natal), ("transit", &self.aspects.transit)] {
            if table.is_empty() {
                return Err(invalid(format!("aspects.{} must define at least one aspect", name)));
            }
            if let Some(bad) = table
                .definitions()
                .iter()
                .find(|d| !d.orb.is_finite() || d.orb < 0.0)
            {
                return Err(invalid(format!(
                    "aspects.{}: orb for {} must be a non-negative number, got {}",
                    name, bad.kind, bad.orb
                )));
            }
        }

        if NaiveTime::parse_from_str(&self.transit.default_time, TIME_FORMAT).is_err() {
            return Err(invalid(format!(
                "transit.default_time must be HH:MM, got '{}'",
                self.transit.default_time
            )));
        }

        if self.geocoder.timeout_secs == 0 {
            return Err(invalid("geocoder.timeout_secs must be greater than zero".into()));
        }

        for place in &self.places {
            if !(-90.0..=90.0).contains(&place.latitude)
                || !(-180.0..=180.0).contains(&place.longitude)
            {
                return Err(invalid(format!(
                    "place '{}' has out-of-range coordinates ({}, {})",
                    place.name, place.latitude, place.longitude
                )));
            }
            if parse_timezone(&place.timezone).is_none() {
                return Err(invalid(format!(
                    "place '{}' has unknown timezone '{}'",
                    place.name, place.timezone
                )));
            }
        }
        Ok(())
    }

    /// Built-in places plus the configured ones.
    pub fn gazetteer(&self) -> Gazetteer {
        Gazetteer::builtin().with_entries(self.places.iter().cloned())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Validation(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspects::{AspectDefinition, AspectKind};
    use crate::location::LocationResolver;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.chart.house_system, "placidus");
        assert_eq!(settings.transit.default_time, "12:00");
        assert_eq!(settings.transit.frame, TransitFrame::Tropical);
        assert_eq!(settings.aspects.natal, AspectTable::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let file = write_toml(
            r#"
            [chart]
            house_system = "whole_sign"
            zodiac_type = "sidereal"

            [transit]
            frame = "natal"
            default_time = "06:00"

            [[aspects.transit]]
            kind = "conjunction"
            orb = 1.5

            [[aspects.transit]]
            kind = "opposition"
            orb = 1.0

            [[places]]
            name = "Kochi, India"
            aliases = ["Cochin"]
            latitude = 9.9312
            longitude = 76.2673
            timezone = "Asia/Kolkata"
            "#,
        );

        let settings = Settings::load(Some(file.path())).unwrap();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.chart.house_system, "whole_sign");
        assert_eq!(settings.chart.sidereal_mode, "lahiri");
        assert_eq!(settings.transit.frame, TransitFrame::Natal);
        assert_eq!(settings.transit.default_time, "06:00");
        assert_eq!(
            settings.aspects.transit.definitions(),
            &[
                AspectDefinition::new(AspectKind::Conjunction, 1.5),
                AspectDefinition::new(AspectKind::Opposition, 1.0),
            ]
        );
        assert_eq!(settings.aspects.natal, AspectTable::default());
        assert!(settings.gazetteer().resolve("cochin").is_ok());
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let file = write_toml("[chart]\nhouse_system = \"equal\"\n");
        env::set_var("NATAL__CHART__HOUSE_SYSTEM", "koch");
        let result = Settings::load(Some(file.path()));
        env::remove_var("NATAL__CHART__HOUSE_SYSTEM");

        assert_eq!(result.unwrap().chart.house_system, "koch");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = Settings::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.aspects.natal = AspectTable::new(vec![]);
        assert!(matches!(settings.validate(), Err(ConfigError::Validation(_))));

        let mut settings = Settings::default();
        settings.aspects.transit =
            AspectTable::new(vec![AspectDefinition::new(AspectKind::Trine, -1.0)]);
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.aspects.natal = AspectTable::default().with_uniform_orb(f64::NAN);
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.transit.default_time = "noon".into();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.geocoder.timeout_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.places.push(GazetteerEntry::new("Nowhere", 95.0, 0.0, "UTC"));
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.places.push(GazetteerEntry::new("Nowhere", 0.0, 0.0, "Mars/Base"));
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("Mars/Base"));
    }
}
