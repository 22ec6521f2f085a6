use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const SIGN_WIDTH: f64 = 30.0;

// ---------------------------
// ## Zodiac Signs
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries = 0,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn from_longitude(longitude: f64) -> Self {
        let sign_index = (normalize_longitude(longitude) / SIGN_WIDTH).floor() as usize;
        // floor() of a value just under 360.0 can still land on 12 after rounding
        Self::ALL[sign_index.min(11)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------
// ## Sign Positions
// ---------------------------

/// A longitude expressed as a sign plus the degree inside that sign.
///
/// Values are kept unrounded; the wire form rounds `degree` to two decimals
/// and `longitude` to four.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignPosition {
    pub sign: ZodiacSign,
    pub degree: f64,
    pub longitude: f64,
}

impl SignPosition {
    pub fn from_longitude(longitude: f64) -> Self {
        let longitude = normalize_longitude(longitude);
        let sign = ZodiacSign::from_longitude(longitude);
        SignPosition {
            sign,
            degree: longitude % SIGN_WIDTH,
            longitude,
        }
    }
}

impl Serialize for SignPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SignPosition", 3)?;
        state.serialize_field("sign", &self.sign)?;
        state.serialize_field("degree", &round_to(self.degree, 2))?;
        state.serialize_field("longitude", &round_to(self.longitude, 4))?;
        state.end()
    }
}

impl fmt::Display for SignPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {:.2}°", self.sign, self.degree)
    }
}

// ---------------------------
// ## Angular Utilities
// ---------------------------

/// Converts an ecliptic longitude into its zodiac position.
pub fn to_sign_position(longitude: f64) -> SignPosition {
    SignPosition::from_longitude(longitude)
}

/// Folds any finite longitude into `[0, 360)`.
pub fn normalize_longitude(longitude: f64) -> f64 {
    let normalized = longitude.rem_euclid(360.0);
    // rem_euclid may return the modulus itself for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Minimal unsigned separation of two longitudes on the circle, in `[0, 180]`.
pub fn angular_separation(a: f64, b: f64) -> f64 {
    let diff = (normalize_longitude(a) - normalize_longitude(b)).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
