//! Current-sky positions compared against a natal chart.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::aspects::{detect_aspects, AspectKind, Pairing};
use crate::chart::{compute_planet_set, Chart, PlanetSet};
use crate::engine::ChartEngine;
use crate::ephemeris::{CelestialBody, EphemerisProvider, Frame, JulianDay};
use crate::error::ChartError;
use crate::location::LocationResolver;
use crate::time::{local_to_utc, parse_timezone};

/// Zodiac frame used for transit positions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitFrame {
    /// Transits are always tropical, whatever the natal chart uses.
    #[default]
    Tropical,
    /// Transits follow the natal chart's zodiac type and sidereal mode.
    Natal,
}

impl TransitFrame {
    fn resolve(self, chart: &Chart) -> Frame {
        match self {
            TransitFrame::Tropical => Frame::Tropical,
            TransitFrame::Natal => chart.meta().frame(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransitAspect {
    pub transit_planet: CelestialBody,
    pub natal_planet: CelestialBody,
    pub aspect: AspectKind,
    pub angle: u16,
    pub orb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitMeta {
    pub date: String,
    pub time: String,
    pub timezone: String,
    pub julian_day: JulianDay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitResult {
    pub transit_planets: PlanetSet,
    pub transit_aspects: Vec<TransitAspect>,
    pub meta: TransitMeta,
}

impl TransitResult {
    pub fn tightest_aspects(&self, limit: usize) -> Vec<TransitAspect> {
        let mut sorted = self.transit_aspects.clone();
        sorted.sort_by(|a, b| a.orb.total_cmp(&b.orb));
        sorted.truncate(limit);
        sorted
    }
}

impl<E: EphemerisProvider, L: LocationResolver> ChartEngine<E, L> {
    /// Positions at `date`/`time` (interpreted in the natal timezone) and
    /// their aspects to the natal planets. A missing time uses the
    /// configured default.
    #[instrument(skip(self, natal), fields(natal_city = %natal.meta().city))]
    pub fn compute_transits(
        &self,
        natal: &Chart,
        date: &str,
        time: Option<&str>,
    ) -> Result<TransitResult, ChartError> {
        let time = time.unwrap_or(self.default_transit_time.as_str());
        let meta = natal.meta();
        // natal charts only ever carry identifiers that parsed
        let timezone = parse_timezone(&meta.timezone).ok_or_else(|| ChartError::TimezoneNotFound {
            place: meta.city.clone(),
            latitude: meta.latitude,
            longitude: meta.longitude,
        })?;

        let utc = local_to_utc(date, time, timezone)?;
        let julian_day = self.ephemeris.julian_day(&utc);
        let frame = self.transit_frame.resolve(natal);
        debug!(%utc, julian_day, ?frame, "transit instant");

        let transit_planets = compute_planet_set(&self.ephemeris, julian_day, frame)?;

        let transit_longitudes = transit_planets.longitudes();
        let natal_longitudes = natal.planets().longitudes();
        let transit_aspects: Vec<TransitAspect> = detect_aspects(
            Pairing::Between(&transit_longitudes, &natal_longitudes),
            &self.transit_aspects,
        )
        .into_iter()
        .map(|hit| TransitAspect {
            transit_planet: hit.first,
            natal_planet: hit.second,
            aspect: hit.kind,
            angle: hit.angle,
            orb: hit.orb,
        })
        .collect();
        debug!(aspects = transit_aspects.len(), "transits computed");

        Ok(TransitResult {
            transit_planets,
            transit_aspects,
            meta: TransitMeta {
                date: date.to_string(),
                time: time.to_string(),
                timezone: meta.timezone.clone(),
                julian_day,
            },
        })
    }
}
