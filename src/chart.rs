use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::aspects::{detect_aspects, AspectKind, Pairing};
use crate::engine::ChartEngine;
use crate::ephemeris::{checked_longitude, CelestialBody, EphemerisProvider, Frame, JulianDay};
use crate::error::ChartError;
use crate::location::{resolve_location, LocationResolver};
use crate::registry::{HouseSystem, SiderealMode, ZodiacType};
use crate::time::local_to_utc;
use crate::zodiac::{round_to, to_sign_position, SignPosition};

// ---------------------------
// ## Planet and House Sets
// ---------------------------

/// Positions of every configured body at one instant, in one zodiac frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PlanetSet {
    positions: BTreeMap<CelestialBody, SignPosition>,
}

impl PlanetSet {
    pub fn from_longitudes(longitudes: impl IntoIterator<Item = (CelestialBody, f64)>) -> Self {
        PlanetSet {
            positions: longitudes
                .into_iter()
                .map(|(body, lon)| (body, to_sign_position(lon)))
                .collect(),
        }
    }

    pub fn get(&self, body: CelestialBody) -> Option<&SignPosition> {
        self.positions.get(&body)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CelestialBody, &SignPosition)> {
        self.positions.iter().map(|(body, pos)| (*body, pos))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// `(body, longitude)` pairs in body order, as consumed by the aspect detector.
    pub fn longitudes(&self) -> Vec<(CelestialBody, f64)> {
        self.iter().map(|(body, pos)| (body, pos.longitude)).collect()
    }
}

/// House cusps plus the two angles.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseSet {
    cusps: [SignPosition; 12],
    ascendant: SignPosition,
    midheaven: SignPosition,
}

impl HouseSet {
    pub fn new(cusps: [f64; 12], ascendant: f64, midheaven: f64) -> Self {
        HouseSet {
            cusps: cusps.map(to_sign_position),
            ascendant: to_sign_position(ascendant),
            midheaven: to_sign_position(midheaven),
        }
    }

    /// Cusp of house `ordinal` (1 through 12).
    pub fn cusp(&self, ordinal: usize) -> Option<&SignPosition> {
        ordinal.checked_sub(1).and_then(|i| self.cusps.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &SignPosition)> {
        self.cusps.iter().enumerate().map(|(i, cusp)| (i + 1, cusp))
    }

    pub fn ascendant(&self) -> &SignPosition {
        &self.ascendant
    }

    pub fn midheaven(&self) -> &SignPosition {
        &self.midheaven
    }
}

impl Serialize for HouseSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cusps.len()))?;
        for (ordinal, cusp) in self.iter() {
            map.serialize_entry(&format!("House {}", ordinal), cusp)?;
        }
        map.end()
    }
}

// ---------------------------
// ## Chart
// ---------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aspect {
    pub planet1: CelestialBody,
    pub planet2: CelestialBody,
    pub aspect: AspectKind,
    pub angle: u16,
    pub orb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartMeta {
    pub date: String,
    pub time: String,
    pub city: String,
    #[serde(serialize_with = "serialize_coordinate")]
    pub latitude: f64,
    #[serde(serialize_with = "serialize_coordinate")]
    pub longitude: f64,
    pub timezone: String,
    #[serde(serialize_with = "serialize_utc")]
    pub utc_datetime: DateTime<Utc>,
    pub julian_day: JulianDay,
    pub house_system: HouseSystem,
    pub zodiac_type: ZodiacType,
    pub sidereal_mode: Option<SiderealMode>,
    /// Defaults substituted for unrecognised option names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

impl ChartMeta {
    pub fn frame(&self) -> Frame {
        match (self.zodiac_type, self.sidereal_mode) {
            (ZodiacType::Sidereal, Some(mode)) => Frame::Sidereal(mode),
            _ => Frame::Tropical,
        }
    }
}

/// A complete natal chart snapshot. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    planets: PlanetSet,
    houses: HouseSet,
    ascendant: SignPosition,
    midheaven: SignPosition,
    aspects: Vec<Aspect>,
    meta: ChartMeta,
}

impl Chart {
    pub fn planets(&self) -> &PlanetSet {
        &self.planets
    }

    pub fn houses(&self) -> &HouseSet {
        &self.houses
    }

    pub fn ascendant(&self) -> &SignPosition {
        &self.ascendant
    }

    pub fn midheaven(&self) -> &SignPosition {
        &self.midheaven
    }

    /// Aspects in detection order.
    pub fn aspects(&self) -> &[Aspect] {
        &self.aspects
    }

    pub fn meta(&self) -> &ChartMeta {
        &self.meta
    }

    /// The `limit` aspects with the smallest orb, tightest first.
    pub fn tightest_aspects(&self, limit: usize) -> Vec<Aspect> {
        let mut sorted = self.aspects.clone();
        sorted.sort_by(|a, b| a.orb.total_cmp(&b.orb));
        sorted.truncate(limit);
        sorted
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Option names as received from the caller. Unknown names fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub house_system: String,
    pub zodiac_type: String,
    pub sidereal_mode: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            house_system: HouseSystem::default().name().to_string(),
            zodiac_type: ZodiacType::default().name().to_string(),
            sidereal_mode: SiderealMode::default().name().to_string(),
        }
    }
}

impl ChartOptions {
    pub fn house_system(mut self, name: &str) -> Self {
        self.house_system = name.to_string();
        self
    }

    pub fn zodiac_type(mut self, name: &str) -> Self {
        self.zodiac_type = name.to_string();
        self
    }

    pub fn sidereal_mode(mut self, name: &str) -> Self {
        self.sidereal_mode = name.to_string();
        self
    }
}

// ---------------------------
// ## Chart Construction
// ---------------------------

impl<E: EphemerisProvider, L: LocationResolver> ChartEngine<E, L> {
    /// Computes the natal chart for a local date, time and place.
    #[instrument(skip(self, options), fields(house_system = %options.house_system, zodiac = %options.zodiac_type))]
    pub fn build_chart(
        &self,
        date: &str,
        time: &str,
        place: &str,
        options: &ChartOptions,
    ) -> Result<Chart, ChartError> {
        let location = resolve_location(&self.locations, place)?;
        debug!(
            latitude = location.latitude,
            longitude = location.longitude,
            timezone = %location.timezone,
            "resolved place"
        );

        let utc = local_to_utc(date, time, location.timezone)?;
        let julian_day = self.ephemeris.julian_day(&utc);
        debug!(%utc, julian_day, "resolved instant");

        let mut notices = Vec::new();
        let house_system = HouseSystem::resolve_or_default(&options.house_system);
        if house_system.fell_back {
            notices.push(format!(
                "unknown house system '{}', using {}",
                options.house_system, house_system.value
            ));
        }
        let zodiac_type = ZodiacType::resolve_or_default(&options.zodiac_type);
        if zodiac_type.fell_back {
            notices.push(format!(
                "unknown zodiac type '{}', using {}",
                options.zodiac_type, zodiac_type.value
            ));
        }
        let frame = match zodiac_type.value {
            ZodiacType::Tropical => Frame::Tropical,
            ZodiacType::Sidereal => {
                let mode = SiderealMode::resolve_or_default(&options.sidereal_mode);
                if mode.fell_back {
                    notices.push(format!(
                        "unknown sidereal mode '{}', using {}",
                        options.sidereal_mode, mode.value
                    ));
                }
                Frame::Sidereal(mode.value)
            }
        };

        let planets = compute_planet_set(&self.ephemeris, julian_day, frame)?;

        let cusps = self.ephemeris.house_cusps(
            julian_day,
            location.latitude,
            location.longitude,
            house_system.value,
            frame,
        )?;
        let houses = HouseSet::new(cusps.cusps, cusps.ascendant, cusps.midheaven);

        let longitudes = planets.longitudes();
        let aspects: Vec<Aspect> = detect_aspects(Pairing::Within(&longitudes), &self.natal_aspects)
            .into_iter()
            .map(|hit| Aspect {
                planet1: hit.first,
                planet2: hit.second,
                aspect: hit.kind,
                angle: hit.angle,
                orb: hit.orb,
            })
            .collect();
        debug!(planets = planets.len(), aspects = aspects.len(), "chart computed");

        Ok(Chart {
            ascendant: *houses.ascendant(),
            midheaven: *houses.midheaven(),
            planets,
            houses,
            aspects,
            meta: ChartMeta {
                date: date.to_string(),
                time: time.to_string(),
                city: place.to_string(),
                latitude: location.latitude,
                longitude: location.longitude,
                timezone: location.timezone.name().to_string(),
                utc_datetime: utc,
                julian_day,
                house_system: house_system.value,
                zodiac_type: zodiac_type.value,
                sidereal_mode: frame.sidereal_mode(),
                notices,
            },
        })
    }
}

/// Longitudes of every body at `julian_day` in `frame`.
pub(crate) fn compute_planet_set<E: EphemerisProvider + ?Sized>(
    ephemeris: &E,
    julian_day: JulianDay,
    frame: Frame,
) -> Result<PlanetSet, ChartError> {
    let longitudes = CelestialBody::iter()
        .map(|body| {
            let value = ephemeris.longitude_of(body, julian_day, frame)?;
            Ok((body, checked_longitude(body, value)?))
        })
        .collect::<Result<Vec<_>, ChartError>>()?;
    Ok(PlanetSet::from_longitudes(longitudes))
}

fn serialize_coordinate<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 4))
}

fn serialize_utc<S: Serializer>(
    value: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339())
}
