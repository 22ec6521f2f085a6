//! Swiss Ephemeris provider over the C library (`libswe`).
//!
//! The library keeps the sidereal mode in process-global state, so every
//! call that depends on it runs "set mode + compute" under one lock.

use once_cell::sync::OnceCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double, c_int};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::ephemeris::{CelestialBody, EphemerisError, EphemerisProvider, Frame, HouseCusps, JulianDay};
use crate::registry::HouseSystem;

// ---------------------------
// ## FFI Bindings
// ---------------------------

mod bindings {
    use super::*;

    extern "C" {
        pub fn swe_set_ephe_path(path: *const c_char);
        pub fn swe_set_sid_mode(sid_mode: c_int, t0: c_double, ayan_t0: c_double);

        pub fn swe_julday(
            year: c_int,
            month: c_int,
            day: c_int,
            hour: c_double,
            gregflag: c_int,
        ) -> c_double;

        pub fn swe_calc_ut(
            tjd_ut: c_double,
            ipl: c_int,
            iflag: c_int,
            xx: *mut c_double,
            serr: *mut c_char,
        ) -> c_int;

        pub fn swe_houses_ex(
            tjd_ut: c_double,
            iflag: c_int,
            geolat: c_double,
            geolon: c_double,
            hsys: c_int,
            cusps: *mut c_double,
            ascmc: *mut c_double,
        ) -> c_int;
    }
}

use bindings::*;

const SE_GREG_CAL: c_int = 1;
const SEFLG_SWIEPH: c_int = 2;
const SEFLG_SIDEREAL: c_int = 64 * 1024;
const SE_ERROR_LEN: usize = 256;

static SWE_LOCK: Mutex<()> = Mutex::new(());
static EPHE_PATH: OnceCell<Option<PathBuf>> = OnceCell::new();

fn lock() -> MutexGuard<'static, ()> {
    SWE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------
// ## Provider
// ---------------------------

/// Ephemeris backed by `libswe`. Without data files the library falls back
/// to its built-in Moshier theory, which does not cover Chiron.
#[derive(Debug, Clone, Copy)]
pub struct SwissEphemeris {
    _private: (),
}

impl SwissEphemeris {
    /// Points the library at `path` the first time any provider is created.
    pub fn new(path: Option<&Path>) -> Result<Self, EphemerisError> {
        if let Some(dir) = path {
            if !dir.is_dir() {
                return Err(EphemerisError::Unavailable(format!(
                    "ephemeris directory {} does not exist",
                    dir.display()
                )));
            }
        }

        let configured = EPHE_PATH.get_or_try_init(|| {
            let _guard = lock();
            match path {
                Some(dir) => {
                    let c_path = CString::new(dir.to_string_lossy().into_owned()).map_err(|_| {
                        EphemerisError::Unavailable(format!("invalid ephemeris path {}", dir.display()))
                    })?;
                    unsafe { swe_set_ephe_path(c_path.as_ptr()) };
                    debug!(path = %dir.display(), "ephemeris path set");
                }
                None => {
                    unsafe { swe_set_ephe_path(std::ptr::null()) };
                    debug!("using default ephemeris path");
                }
            }
            Ok::<_, EphemerisError>(path.map(Path::to_path_buf))
        })?;

        if configured.as_deref() != path {
            warn!(
                requested = ?path,
                active = ?configured,
                "ephemeris path already set for this process, keeping the first one"
            );
        }
        Ok(SwissEphemeris { _private: () })
    }

    fn flags(frame: Frame) -> c_int {
        match frame {
            Frame::Tropical => SEFLG_SWIEPH,
            Frame::Sidereal(mode) => {
                unsafe { swe_set_sid_mode(mode.code(), 0.0, 0.0) };
                SEFLG_SWIEPH | SEFLG_SIDEREAL
            }
        }
    }
}

impl EphemerisProvider for SwissEphemeris {
    fn julian_day(&self, utc: &chrono::DateTime<chrono::Utc>) -> JulianDay {
        use chrono::{Datelike, Timelike};
        let hour = f64::from(utc.hour())
            + f64::from(utc.minute()) / 60.0
            + f64::from(utc.second()) / 3600.0;
        unsafe {
            swe_julday(
                utc.year(),
                utc.month() as c_int,
                utc.day() as c_int,
                hour,
                SE_GREG_CAL,
            )
        }
    }

    fn longitude_of(
        &self,
        body: CelestialBody,
        julian_day: JulianDay,
        frame: Frame,
    ) -> Result<f64, EphemerisError> {
        let mut results: [c_double; 6] = [0.0; 6];
        let mut error: [c_char; SE_ERROR_LEN] = [0; SE_ERROR_LEN];

        let calc_result = {
            let _guard = lock();
            let iflag = Self::flags(frame);
            unsafe {
                swe_calc_ut(
                    julian_day,
                    body.swe_id(),
                    iflag,
                    results.as_mut_ptr(),
                    error.as_mut_ptr(),
                )
            }
        };

        if calc_result < 0 {
            let message = unsafe { CStr::from_ptr(error.as_ptr()) }
                .to_string_lossy()
                .into_owned();
            return Err(EphemerisError::Calculation {
                code: calc_result,
                message,
            });
        }
        Ok(results[0])
    }

    fn house_cusps(
        &self,
        julian_day: JulianDay,
        latitude: f64,
        longitude: f64,
        system: HouseSystem,
        frame: Frame,
    ) -> Result<HouseCusps, EphemerisError> {
        let mut cusps: [c_double; 13] = [0.0; 13];
        let mut ascmc: [c_double; 10] = [0.0; 10];

        let calc_result = {
            let _guard = lock();
            let iflag = Self::flags(frame) & !SEFLG_SWIEPH;
            unsafe {
                swe_houses_ex(
                    julian_day,
                    iflag,
                    latitude,
                    longitude,
                    system.code() as c_int,
                    cusps.as_mut_ptr(),
                    ascmc.as_mut_ptr(),
                )
            }
        };

        if calc_result < 0 {
            return Err(EphemerisError::Calculation {
                code: calc_result,
                message: format!("house calculation failed for {} at ({}, {})", system, latitude, longitude),
            });
        }

        let mut twelve = [0.0; 12];
        twelve.copy_from_slice(&cusps[1..13]);
        Ok(HouseCusps {
            cusps: twelve,
            ascendant: ascmc[0],
            midheaven: ascmc[1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SiderealMode;
    use crate::zodiac::angular_separation;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_julian_day_matches_library() {
        let eph = SwissEphemeris::new(None).unwrap();
        let noon = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_relative_eq!(eph.julian_day(&noon), 2_451_545.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sun_at_j2000() {
        let eph = SwissEphemeris::new(None).unwrap();
        let sun = eph
            .longitude_of(CelestialBody::Sun, 2_451_545.0, Frame::Tropical)
            .unwrap();
        assert_relative_eq!(sun, 280.37, epsilon = 0.05);

        let lahiri = eph
            .longitude_of(CelestialBody::Sun, 2_451_545.0, Frame::Sidereal(SiderealMode::Lahiri))
            .unwrap();
        // Lahiri ayanamsa at J2000 is about 23.86 degrees
        assert_relative_eq!(angular_separation(sun, lahiri), 23.86, epsilon = 0.05);
    }

    #[test]
    fn test_house_cusps_start_at_ascendant() {
        let eph = SwissEphemeris::new(None).unwrap();
        let houses = eph
            .house_cusps(2_451_545.0, 30.2672, -97.7431, HouseSystem::Placidus, Frame::Tropical)
            .unwrap();
        assert_relative_eq!(houses.cusps[0], houses.ascendant, epsilon = 1e-9);
        assert_relative_eq!(houses.cusps[9], houses.midheaven, epsilon = 1e-9);
    }
}
