//! Angular relationships between two sets of longitudes.
//!
//! The detector works on labelled longitudes so the same code serves natal
//! aspects (pairs within one chart) and transits (transit bodies against
//! natal bodies).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::zodiac::{angular_separation, round_to};

// ---------------------------
// ## Aspect Definitions
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectKind {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl AspectKind {
    /// Exact angle of the aspect in degrees.
    pub fn angle(self) -> u16 {
        match self {
            AspectKind::Conjunction => 0,
            AspectKind::Sextile => 60,
            AspectKind::Square => 90,
            AspectKind::Trine => 120,
            AspectKind::Opposition => 180,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AspectKind::Conjunction => "conjunction",
            AspectKind::Sextile => "sextile",
            AspectKind::Square => "square",
            AspectKind::Trine => "trine",
            AspectKind::Opposition => "opposition",
        }
    }
}

impl fmt::Display for AspectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectDefinition {
    pub kind: AspectKind,
    /// Largest allowed deviation from the exact angle, in degrees.
    pub orb: f64,
}

impl AspectDefinition {
    pub const fn new(kind: AspectKind, orb: f64) -> Self {
        AspectDefinition { kind, orb }
    }
}

/// Ordered list of aspect definitions. Every definition is checked for every pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AspectTable {
    definitions: Vec<AspectDefinition>,
}

impl AspectTable {
    pub fn new(definitions: Vec<AspectDefinition>) -> Self {
        AspectTable { definitions }
    }

    pub fn definitions(&self) -> &[AspectDefinition] {
        &self.definitions
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Same kinds, every orb replaced by `orb`.
    pub fn with_uniform_orb(&self, orb: f64) -> Self {
        AspectTable {
            definitions: self
                .definitions
                .iter()
                .map(|d| AspectDefinition::new(d.kind, orb))
                .collect(),
        }
    }
}

impl Default for AspectTable {
    fn default() -> Self {
        AspectTable::new(vec![
            AspectDefinition::new(AspectKind::Conjunction, 8.0),
            AspectDefinition::new(AspectKind::Sextile, 6.0),
            AspectDefinition::new(AspectKind::Square, 7.0),
            AspectDefinition::new(AspectKind::Trine, 8.0),
            AspectDefinition::new(AspectKind::Opposition, 8.0),
        ])
    }
}

// ---------------------------
// ## Detection
// ---------------------------

/// Which pairs of labelled longitudes are compared.
#[derive(Debug, Clone, Copy)]
pub enum Pairing<'a, L> {
    /// Unordered pairs `(i, j)` with `i < j` inside one set.
    Within(&'a [(L, f64)]),
    /// Every `(a, b)` of the Cartesian product, in that order.
    Between(&'a [(L, f64)], &'a [(L, f64)]),
}

impl<'a, L: Copy + 'a> Pairing<'a, L> {
    pub fn pairs(&self) -> Box<dyn Iterator<Item = ((L, f64), (L, f64))> + 'a> {
        match *self {
            Pairing::Within(set) => Box::new(set.iter().enumerate().flat_map(move |(i, a)| {
                set[i + 1..].iter().map(move |b| (*a, *b))
            })),
            Pairing::Between(set_a, set_b) => {
                Box::new(set_a.iter().flat_map(move |a| set_b.iter().map(move |b| (*a, *b))))
            }
        }
    }

    pub fn pair_count(&self) -> usize {
        match *self {
            Pairing::Within(set) => set.len() * set.len().saturating_sub(1) / 2,
            Pairing::Between(set_a, set_b) => set_a.len() * set_b.len(),
        }
    }
}

/// One matched aspect between two labels, in pair order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectHit<L> {
    pub first: L,
    pub second: L,
    pub kind: AspectKind,
    pub angle: u16,
    /// Deviation from the exact angle, rounded to two decimals.
    pub orb: f64,
}

/// Finds every aspect in `table` formed by the pairs of `pairing`.
///
/// Output follows pair iteration order, then table order. A pair is reported
/// once per matching definition; definitions are not assumed exclusive.
pub fn detect_aspects<L: Copy>(pairing: Pairing<'_, L>, table: &AspectTable) -> Vec<AspectHit<L>> {
    let mut hits = Vec::new();
    for ((label_a, lon_a), (label_b, lon_b)) in pairing.pairs() {
        let separation = angular_separation(lon_a, lon_b);
        for definition in table.definitions() {
            let deviation = (separation - f64::from(definition.kind.angle())).abs();
            if deviation <= definition.orb {
                hits.push(AspectHit {
                    first: label_a,
                    second: label_b,
                    kind: definition.kind,
                    angle: definition.kind.angle(),
                    orb: round_to(deviation, 2),
                });
            }
        }
    }
    hits
}
