//! Natal chart and transit computation.
//!
//! A [`ChartEngine`] pairs an [`EphemerisProvider`] with a [`LocationResolver`]
//! and turns a local birth date, time and place into a [`Chart`]: planet
//! positions, house cusps, angles and the aspects between planets. The same
//! engine compares a later instant against a chart as a [`TransitResult`].
//!
//! ```ignore
//! use natal_core::{ChartEngine, ChartOptions, Gazetteer, SwissEphemeris};
//!
//! let engine = ChartEngine::new(SwissEphemeris::new(None)?, Gazetteer::builtin());
//! let chart = engine.build_chart("1990-03-15", "14:30", "Austin, TX", &ChartOptions::default())?;
//! println!("{}", serde_json::to_string_pretty(&chart)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod aspects;
pub mod chart;
pub mod config;
pub mod digest;
pub mod engine;
pub mod ephemeris;
pub mod error;
pub mod extract;
pub mod location;
#[cfg(feature = "geocoding")]
pub mod nominatim;
pub mod registry;
pub mod request;
#[cfg(feature = "swisseph")]
pub mod swisseph;
pub mod time;
pub mod transits;
pub mod zodiac;

#[cfg(test)]
mod fixtures;

pub use aspects::{detect_aspects, AspectDefinition, AspectHit, AspectKind, AspectTable, Pairing};
pub use chart::{Aspect, Chart, ChartMeta, ChartOptions, HouseSet, PlanetSet};
pub use config::{ConfigError, Settings};
pub use digest::ChartDigest;
pub use engine::ChartEngine;
pub use ephemeris::{CelestialBody, EphemerisError, EphemerisProvider, Frame, HouseCusps, JulianDay};
pub use error::ChartError;
pub use extract::{extract_birth_data, BirthData};
pub use location::{Coordinates, Fallback, Gazetteer, GazetteerEntry, LocationError, LocationResolver};
#[cfg(feature = "geocoding")]
pub use nominatim::NominatimResolver;
pub use registry::{HouseSystem, Resolution, SiderealMode, ZodiacType};
pub use request::{ChartDocument, ChartRequest, USAGE_PROMPT};
#[cfg(feature = "swisseph")]
pub use swisseph::SwissEphemeris;
pub use transits::{TransitAspect, TransitFrame, TransitResult};
pub use zodiac::{angular_separation, to_sign_position, SignPosition, ZodiacSign};
