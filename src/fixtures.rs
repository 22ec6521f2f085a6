//! Deterministic providers for tests.

use std::sync::Mutex;

use crate::engine::ChartEngine;
use crate::ephemeris::{CelestialBody, EphemerisError, EphemerisProvider, Frame, HouseCusps, JulianDay};
use crate::location::Gazetteer;
use crate::registry::HouseSystem;
use crate::zodiac::normalize_longitude;

const J2000: JulianDay = 2_451_545.0;

/// Linear motion from a fixed epoch position. Not astronomy, just stable numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureEphemeris;

impl FixtureEphemeris {
    pub const AYANAMSA: f64 = 23.75;

    fn motion(body: CelestialBody) -> (f64, f64) {
        // (longitude at J2000, degrees per day)
        match body {
            CelestialBody::Sun => (280.46, 0.985_647),
            CelestialBody::Moon => (218.32, 13.176_396),
            CelestialBody::Mercury => (252.25, 1.383),
            CelestialBody::Venus => (181.98, 1.602),
            CelestialBody::Mars => (355.43, 0.524),
            CelestialBody::Jupiter => (34.35, 0.083),
            CelestialBody::Saturn => (50.08, 0.033),
            CelestialBody::Uranus => (314.06, 0.011_7),
            CelestialBody::Neptune => (304.35, 0.006),
            CelestialBody::Pluto => (238.93, 0.004),
            CelestialBody::NorthNode => (125.04, -0.052_95),
            CelestialBody::Chiron => (251.20, 0.019),
        }
    }

    fn apply_frame(longitude: f64, frame: Frame) -> f64 {
        match frame {
            Frame::Tropical => normalize_longitude(longitude),
            Frame::Sidereal(_) => normalize_longitude(longitude - Self::AYANAMSA),
        }
    }
}

impl EphemerisProvider for FixtureEphemeris {
    fn longitude_of(
        &self,
        body: CelestialBody,
        julian_day: JulianDay,
        frame: Frame,
    ) -> Result<f64, EphemerisError> {
        let (epoch, rate) = Self::motion(body);
        Ok(Self::apply_frame(epoch + rate * (julian_day - J2000), frame))
    }

    fn house_cusps(
        &self,
        julian_day: JulianDay,
        latitude: f64,
        longitude: f64,
        _system: HouseSystem,
        frame: Frame,
    ) -> Result<HouseCusps, EphemerisError> {
        let ascendant = Self::apply_frame(julian_day.fract() * 360.0 + longitude, frame);
        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            *cusp = normalize_longitude(ascendant + 30.0 * i as f64);
        }
        Ok(HouseCusps {
            cusps,
            ascendant,
            midheaven: normalize_longitude(ascendant - 90.0 + latitude * 0.1),
        })
    }
}

/// Fails every calculation with a provider status code.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEphemeris;

impl EphemerisProvider for FailingEphemeris {
    fn longitude_of(
        &self,
        body: CelestialBody,
        _julian_day: JulianDay,
        _frame: Frame,
    ) -> Result<f64, EphemerisError> {
        Err(EphemerisError::Calculation {
            code: -1,
            message: format!("no data for {}", body),
        })
    }

    fn house_cusps(
        &self,
        _julian_day: JulianDay,
        _latitude: f64,
        _longitude: f64,
        _system: HouseSystem,
        _frame: Frame,
    ) -> Result<HouseCusps, EphemerisError> {
        Err(EphemerisError::Calculation {
            code: -1,
            message: "no house data".into(),
        })
    }
}

/// Answers like [`FixtureEphemeris`] and remembers the frame of every call.
#[derive(Debug, Default)]
pub struct RecordingEphemeris {
    frames: Mutex<Vec<Frame>>,
    house_systems: Mutex<Vec<HouseSystem>>,
}

impl RecordingEphemeris {
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    pub fn house_systems(&self) -> Vec<HouseSystem> {
        self.house_systems.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.frames.lock().unwrap().clear();
        self.house_systems.lock().unwrap().clear();
    }
}

impl EphemerisProvider for RecordingEphemeris {
    fn longitude_of(
        &self,
        body: CelestialBody,
        julian_day: JulianDay,
        frame: Frame,
    ) -> Result<f64, EphemerisError> {
        self.frames.lock().unwrap().push(frame);
        FixtureEphemeris.longitude_of(body, julian_day, frame)
    }

    fn house_cusps(
        &self,
        julian_day: JulianDay,
        latitude: f64,
        longitude: f64,
        system: HouseSystem,
        frame: Frame,
    ) -> Result<HouseCusps, EphemerisError> {
        self.frames.lock().unwrap().push(frame);
        self.house_systems.lock().unwrap().push(system);
        FixtureEphemeris.house_cusps(julian_day, latitude, longitude, system, frame)
    }
}

pub fn fixture_engine() -> ChartEngine<FixtureEphemeris, Gazetteer> {
    ChartEngine::new(FixtureEphemeris, Gazetteer::builtin())
}
