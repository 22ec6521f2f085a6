use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::registry::{HouseSystem, SiderealMode};

pub type JulianDay = f64;

/// Julian Day of the Unix epoch.
const UNIX_EPOCH_JD: JulianDay = 2_440_587.5;
const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------
// ## Celestial Bodies
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CelestialBody {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    #[serde(rename = "North Node")]
    NorthNode,
    Chiron,
}

impl CelestialBody {
    pub const ALL: [CelestialBody; 12] = [
        CelestialBody::Sun,
        CelestialBody::Moon,
        CelestialBody::Mercury,
        CelestialBody::Venus,
        CelestialBody::Mars,
        CelestialBody::Jupiter,
        CelestialBody::Saturn,
        CelestialBody::Uranus,
        CelestialBody::Neptune,
        CelestialBody::Pluto,
        CelestialBody::NorthNode,
        CelestialBody::Chiron,
    ];

    pub fn iter() -> impl Iterator<Item = CelestialBody> {
        Self::ALL.iter().copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            CelestialBody::Sun => "Sun",
            CelestialBody::Moon => "Moon",
            CelestialBody::Mercury => "Mercury",
            CelestialBody::Venus => "Venus",
            CelestialBody::Mars => "Mars",
            CelestialBody::Jupiter => "Jupiter",
            CelestialBody::Saturn => "Saturn",
            CelestialBody::Uranus => "Uranus",
            CelestialBody::Neptune => "Neptune",
            CelestialBody::Pluto => "Pluto",
            CelestialBody::NorthNode => "North Node",
            CelestialBody::Chiron => "Chiron",
        }
    }

    /// Body number used by `swe_calc_ut`. The node is the mean node.
    pub fn swe_id(self) -> i32 {
        match self {
            CelestialBody::Sun => 0,
            CelestialBody::Moon => 1,
            CelestialBody::Mercury => 2,
            CelestialBody::Venus => 3,
            CelestialBody::Mars => 4,
            CelestialBody::Jupiter => 5,
            CelestialBody::Saturn => 6,
            CelestialBody::Uranus => 7,
            CelestialBody::Neptune => 8,
            CelestialBody::Pluto => 9,
            CelestialBody::NorthNode => 10,
            CelestialBody::Chiron => 15,
        }
    }
}

impl fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------
// ## Frames and Results
// ---------------------------

/// Zodiac frame requested for a single provider call.
///
/// The frame travels with every call so that no provider-wide "current
/// sidereal mode" has to be set beforehand.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Frame {
    #[default]
    Tropical,
    Sidereal(SiderealMode),
}

impl Frame {
    pub fn sidereal_mode(self) -> Option<SiderealMode> {
        match self {
            Frame::Tropical => None,
            Frame::Sidereal(mode) => Some(mode),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseCusps {
    /// Cusps of houses 1 through 12, in order.
    pub cusps: [f64; 12],
    pub ascendant: f64,
    pub midheaven: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EphemerisError {
    #[error("ephemeris calculation failed ({code}): {message}")]
    Calculation { code: i32, message: String },
    #[error("ephemeris unavailable: {0}")]
    Unavailable(String),
    #[error("ephemeris returned an invalid value: {0}")]
    InvalidOutput(String),
}

// ---------------------------
// ## Provider Interface
// ---------------------------

/// Source of planetary longitudes and house cusps.
///
/// Implementations must be deterministic for identical inputs. The engine
/// never caches provider answers.
pub trait EphemerisProvider {
    /// Continuous time coordinate for a UTC instant.
    fn julian_day(&self, utc: &DateTime<Utc>) -> JulianDay {
        julian_day_from_utc(utc)
    }

    /// Ecliptic longitude of `body` in degrees.
    fn longitude_of(
        &self,
        body: CelestialBody,
        julian_day: JulianDay,
        frame: Frame,
    ) -> Result<f64, EphemerisError>;

    fn house_cusps(
        &self,
        julian_day: JulianDay,
        latitude: f64,
        longitude: f64,
        system: HouseSystem,
        frame: Frame,
    ) -> Result<HouseCusps, EphemerisError>;
}

impl<P: EphemerisProvider + ?Sized> EphemerisProvider for &P {
    fn julian_day(&self, utc: &DateTime<Utc>) -> JulianDay {
        (**self).julian_day(utc)
    }

    fn longitude_of(
        &self,
        body: CelestialBody,
        julian_day: JulianDay,
        frame: Frame,
    ) -> Result<f64, EphemerisError> {
        (**self).longitude_of(body, julian_day, frame)
    }

    fn house_cusps(
        &self,
        julian_day: JulianDay,
        latitude: f64,
        longitude: f64,
        system: HouseSystem,
        frame: Frame,
    ) -> Result<HouseCusps, EphemerisError> {
        (**self).house_cusps(julian_day, latitude, longitude, system, frame)
    }
}

/// UT Julian Day of a UTC instant (Gregorian calendar).
pub fn julian_day_from_utc(utc: &DateTime<Utc>) -> JulianDay {
    let seconds = utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) / 1e9;
    UNIX_EPOCH_JD + seconds / SECONDS_PER_DAY
}

pub(crate) fn checked_longitude(body: CelestialBody, value: f64) -> Result<f64, EphemerisError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EphemerisError::InvalidOutput(format!(
            "non-finite longitude for {}",
            body
        )))
    }
}
