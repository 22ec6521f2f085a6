//! Plain-text summary of a chart for narration.

use std::fmt;

use crate::chart::{Aspect, Chart};
use crate::ephemeris::CelestialBody;
use crate::request::ChartDocument;
use crate::transits::{TransitAspect, TransitResult};
use crate::zodiac::{SignPosition, ZodiacSign};

pub const TOP_ASPECTS: usize = 10;
pub const TOP_TRANSITS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartDigest {
    pub date: String,
    pub time: String,
    pub city: String,
    pub sun: Option<ZodiacSign>,
    pub moon: Option<ZodiacSign>,
    pub ascendant: ZodiacSign,
    pub midheaven: ZodiacSign,
    pub placements: Vec<(CelestialBody, SignPosition)>,
    pub houses: Vec<(usize, SignPosition)>,
    /// Tightest natal aspects first.
    pub aspects: Vec<Aspect>,
    /// Tightest transits first; empty without transits.
    pub transits: Vec<TransitAspect>,
}

impl ChartDigest {
    pub fn new(chart: &Chart, transits: Option<&TransitResult>) -> Self {
        let meta = chart.meta();
        let sign_of = |body| chart.planets().get(body).map(|p: &SignPosition| p.sign);
        ChartDigest {
            date: meta.date.clone(),
            time: meta.time.clone(),
            city: meta.city.clone(),
            sun: sign_of(CelestialBody::Sun),
            moon: sign_of(CelestialBody::Moon),
            ascendant: chart.ascendant().sign,
            midheaven: chart.midheaven().sign,
            placements: chart.planets().iter().map(|(b, p)| (b, *p)).collect(),
            houses: chart.houses().iter().map(|(n, p)| (n, *p)).collect(),
            aspects: chart.tightest_aspects(TOP_ASPECTS),
            transits: transits
                .map(|t| t.tightest_aspects(TOP_TRANSITS))
                .unwrap_or_default(),
        }
    }

    pub fn from_document(document: &ChartDocument) -> Self {
        ChartDigest::new(&document.chart, document.transits.as_ref())
    }
}

fn sign_or_unknown(sign: Option<ZodiacSign>) -> String {
    sign.map_or_else(|| "unknown".to_string(), |s| s.to_string())
}

impl fmt::Display for ChartDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Birth: {} {}, {}", self.date, self.time, self.city)?;
        writeln!(
            f,
            "Sun: {} | Moon: {} | Ascendant: {} | Midheaven: {}",
            sign_or_unknown(self.sun),
            sign_or_unknown(self.moon),
            self.ascendant,
            self.midheaven
        )?;

        writeln!(f, "\nPlanets:")?;
        for (body, position) in &self.placements {
            writeln!(f, "  {}: {}", body, position)?;
        }

        writeln!(f, "\nHouses:")?;
        for (ordinal, cusp) in &self.houses {
            writeln!(f, "  House {}: {}", ordinal, cusp)?;
        }

        writeln!(f, "\nAspects (top {}):", TOP_ASPECTS)?;
        for aspect in &self.aspects {
            writeln!(
                f,
                "  {} {} {} (orb: {}°)",
                aspect.planet1, aspect.aspect, aspect.planet2, aspect.orb
            )?;
        }

        if !self.transits.is_empty() {
            writeln!(f, "\nTransits (top {}):", TOP_TRANSITS)?;
            for transit in &self.transits {
                writeln!(
                    f,
                    "  {} {} natal {} (orb: {}°)",
                    transit.transit_planet, transit.aspect, transit.natal_planet, transit.orb
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartOptions;
    use crate::fixtures::fixture_engine;
    use crate::request::ChartRequest;

    #[test]
    fn test_digest_limits_and_order() {
        let engine = fixture_engine();
        let chart = engine
            .build_chart("1990-03-15", "14:30", "Austin, TX", &ChartOptions::default())
            .unwrap();
        let transits = engine.compute_transits(&chart, "2024-06-01", None).unwrap();
        let digest = ChartDigest::new(&chart, Some(&transits));

        assert_eq!(digest.sun, Some(chart.planets().get(CelestialBody::Sun).unwrap().sign));
        assert_eq!(digest.ascendant, chart.ascendant().sign);
        assert_eq!(digest.placements.len(), 12);
        assert_eq!(digest.houses.len(), 12);
        assert!(digest.aspects.len() <= TOP_ASPECTS);
        assert_eq!(digest.aspects.len(), chart.aspects().len().min(TOP_ASPECTS));
        assert!(digest.aspects.windows(2).all(|w| w[0].orb <= w[1].orb));
        assert!(digest.transits.len() <= TOP_TRANSITS);
    }

    #[test]
    fn test_digest_text() {
        let engine = fixture_engine();
        let document = engine
            .handle(&ChartRequest::new("1990-03-15", "14:30", "Austin, TX"))
            .unwrap();
        let text = ChartDigest::from_document(&document).to_string();

        assert!(text.starts_with("Birth: 1990-03-15 14:30, Austin, TX\n"));
        assert!(text.contains("\nPlanets:\n  Sun: "));
        assert!(text.contains("  North Node: "));
        assert!(text.contains("  House 12: "));
        assert!(!text.contains("Transits"));
    }
}
