use thiserror::Error;

use crate::ephemeris::EphemerisError;

/// Failures surfaced by chart and transit computation.
///
/// None of these are recovered from inside the crate: a chart is either
/// computed completely or not at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("could not find a location for '{0}'")]
    LocationNotFound(String),

    #[error("could not determine a timezone for '{place}' ({latitude:.4}, {longitude:.4})")]
    TimezoneNotFound {
        place: String,
        latitude: f64,
        longitude: f64,
    },

    #[error("invalid date/time '{date} {time}': expected YYYY-MM-DD and HH:MM (24-hour)")]
    InvalidDateTime { date: String, time: String },

    #[error(transparent)]
    EphemerisFailure(#[from] EphemerisError),

    #[error("location service failed: {0}")]
    LocationServiceFailure(String),
}
