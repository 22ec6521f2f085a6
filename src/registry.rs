//! House systems, sidereal modes and zodiac frames known to the engine.
//!
//! Lookups by name never fail. An unknown name resolves to the documented
//! default (Placidus, Lahiri, tropical) and the [`Resolution`] carries a
//! flag so callers can report the substitution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a by-name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<T> {
    pub value: T,
    pub fell_back: bool,
}

impl<T> Resolution<T> {
    fn exact(value: T) -> Self {
        Resolution {
            value,
            fell_back: false,
        }
    }

    fn fallback(value: T) -> Self {
        Resolution {
            value,
            fell_back: true,
        }
    }
}

fn normalize_key(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

// ---------------------------
// ## House Systems
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseSystem {
    #[default]
    Placidus,
    Koch,
    WholeSign,
    Equal,
    Regiomontanus,
    Campanus,
    Porphyry,
    Morinus,
}

impl HouseSystem {
    pub const ALL: [HouseSystem; 8] = [
        HouseSystem::Placidus,
        HouseSystem::Koch,
        HouseSystem::WholeSign,
        HouseSystem::Equal,
        HouseSystem::Regiomontanus,
        HouseSystem::Campanus,
        HouseSystem::Porphyry,
        HouseSystem::Morinus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HouseSystem::Placidus => "placidus",
            HouseSystem::Koch => "koch",
            HouseSystem::WholeSign => "whole_sign",
            HouseSystem::Equal => "equal",
            HouseSystem::Regiomontanus => "regiomontanus",
            HouseSystem::Campanus => "campanus",
            HouseSystem::Porphyry => "porphyry",
            HouseSystem::Morinus => "morinus",
        }
    }

    /// Single-letter house method code understood by the Swiss Ephemeris.
    pub fn code(self) -> char {
        match self {
            HouseSystem::Placidus => 'P',
            HouseSystem::Koch => 'K',
            HouseSystem::WholeSign => 'W',
            HouseSystem::Equal => 'E',
            HouseSystem::Regiomontanus => 'R',
            HouseSystem::Campanus => 'C',
            HouseSystem::Porphyry => 'O',
            HouseSystem::Morinus => 'M',
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_key(name);
        Self::ALL.into_iter().find(|system| system.name() == key)
    }

    pub fn resolve_or_default(name: &str) -> Resolution<Self> {
        match Self::from_name(name) {
            Some(system) => Resolution::exact(system),
            None => {
                tracing::warn!(
                    requested = name,
                    fallback = Self::default().name(),
                    "unknown house system, using default"
                );
                Resolution::fallback(Self::default())
            }
        }
    }
}

impl fmt::Display for HouseSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------
// ## Sidereal Modes
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiderealMode {
    FaganBradley,
    #[default]
    Lahiri,
    Raman,
    Krishnamurti,
    #[serde(alias = "jyotish")]
    J2000,
}

impl SiderealMode {
    pub const ALL: [SiderealMode; 5] = [
        SiderealMode::FaganBradley,
        SiderealMode::Lahiri,
        SiderealMode::Raman,
        SiderealMode::Krishnamurti,
        SiderealMode::J2000,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SiderealMode::FaganBradley => "fagan_bradley",
            SiderealMode::Lahiri => "lahiri",
            SiderealMode::Raman => "raman",
            SiderealMode::Krishnamurti => "krishnamurti",
            SiderealMode::J2000 => "j2000",
        }
    }

    /// Ayanamsa selector (`SE_SIDM_*`) used by the Swiss Ephemeris.
    pub fn code(self) -> i32 {
        match self {
            SiderealMode::FaganBradley => 0,
            SiderealMode::Lahiri => 1,
            SiderealMode::Raman => 3,
            SiderealMode::Krishnamurti => 5,
            SiderealMode::J2000 => 18,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_key(name);
        if key == "jyotish" {
            return Some(SiderealMode::J2000);
        }
        Self::ALL.into_iter().find(|mode| mode.name() == key)
    }

    pub fn resolve_or_default(name: &str) -> Resolution<Self> {
        match Self::from_name(name) {
            Some(mode) => Resolution::exact(mode),
            None => {
                tracing::warn!(
                    requested = name,
                    fallback = Self::default().name(),
                    "unknown sidereal mode, using default"
                );
                Resolution::fallback(Self::default())
            }
        }
    }
}

impl fmt::Display for SiderealMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------
// ## Zodiac Type
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZodiacType {
    #[default]
    Tropical,
    Sidereal,
}

impl ZodiacType {
    pub fn name(self) -> &'static str {
        match self {
            ZodiacType::Tropical => "tropical",
            ZodiacType::Sidereal => "sidereal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match normalize_key(name).as_str() {
            "tropical" => Some(ZodiacType::Tropical),
            "sidereal" => Some(ZodiacType::Sidereal),
            _ => None,
        }
    }

    pub fn resolve_or_default(name: &str) -> Resolution<Self> {
        match Self::from_name(name) {
            Some(kind) => Resolution::exact(kind),
            None => {
                tracing::warn!(requested = name, "unknown zodiac type, using tropical");
                Resolution::fallback(Self::default())
            }
        }
    }
}

impl fmt::Display for ZodiacType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
