use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart::{Chart, ChartOptions};
use crate::engine::ChartEngine;
use crate::ephemeris::EphemerisProvider;
use crate::error::ChartError;
use crate::extract::extract_birth_data;
use crate::location::LocationResolver;
use crate::transits::TransitResult;

/// Shown when a message carries no usable birth data.
pub const USAGE_PROMPT: &str = "\
I can calculate a natal chart from your birth details.

I need:
  - Birth date (YYYY-MM-DD)
  - Birth time (HH:MM, 24-hour format)
  - Birth city (e.g. 'Austin, TX' or 'Paris, France')

Or just send: 1992-10-28, 22:30, Lexington, KY";

/// A structured chart request. Unset options use the engine defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChartRequest {
    pub date: String,
    pub time: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zodiac_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidereal_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Message {
    BirthData(ChartRequest),
}

impl ChartRequest {
    pub fn new(date: &str, time: &str, city: &str) -> Self {
        ChartRequest {
            date: date.to_string(),
            time: time.to_string(),
            city: city.to_string(),
            ..Default::default()
        }
    }

    pub fn with_transit(mut self, date: &str, time: Option<&str>) -> Self {
        self.transit_date = Some(date.to_string());
        self.transit_time = time.map(str::to_string);
        self
    }

    /// Reads a `{"type": "birth_data", ...}` document, or failing that,
    /// birth data written as plain text. `None` means neither worked.
    pub fn from_message(text: &str) -> Option<Self> {
        match serde_json::from_str::<Message>(text) {
            Ok(Message::BirthData(request)) => Some(request),
            Err(e) => {
                debug!(error = %e, "not a structured request, trying free text");
                extract_birth_data(text).map(|b| ChartRequest::new(&b.date, &b.time, &b.place))
            }
        }
    }

    /// Request options layered over `defaults`.
    pub fn options(&self, defaults: &ChartOptions) -> ChartOptions {
        ChartOptions {
            house_system: self
                .house_system
                .clone()
                .unwrap_or_else(|| defaults.house_system.clone()),
            zodiac_type: self
                .zodiac_type
                .clone()
                .unwrap_or_else(|| defaults.zodiac_type.clone()),
            sidereal_mode: self
                .sidereal_mode
                .clone()
                .unwrap_or_else(|| defaults.sidereal_mode.clone()),
        }
    }
}

/// A chart with optional transits attached under `transits`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDocument {
    #[serde(flatten)]
    pub chart: Chart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transits: Option<TransitResult>,
}

impl ChartDocument {
    /// `{"type": "chart_result", "chart": ...}` as sent to renderers.
    pub fn envelope(&self) -> serde_json::Result<serde_json::Value> {
        Ok(serde_json::json!({
            "type": "chart_result",
            "chart": serde_json::to_value(self)?,
        }))
    }
}

impl<E: EphemerisProvider, L: LocationResolver> ChartEngine<E, L> {
    pub fn handle(&self, request: &ChartRequest) -> Result<ChartDocument, ChartError> {
        let options = request.options(&self.default_options);
        let chart = self.build_chart(&request.date, &request.time, &request.city, &options)?;
        let transits = match &request.transit_date {
            Some(date) => Some(self.compute_transits(&chart, date, request.transit_time.as_deref())?),
            None => None,
        };
        Ok(ChartDocument { chart, transits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::fixture_engine;
    use crate::registry::{HouseSystem, SiderealMode};

    #[test]
    fn test_structured_message() {
        let request = ChartRequest::from_message(
            r#"{"type": "birth_data", "date": "1990-03-15", "time": "14:30",
                "city": "Austin, TX", "zodiac_type": "sidereal", "transit_date": "2024-06-01"}"#,
        )
        .unwrap();
        assert_eq!(request.city, "Austin, TX");
        assert_eq!(request.zodiac_type.as_deref(), Some("sidereal"));
        assert_eq!(request.house_system, None);
        assert_eq!(request.transit_date.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn test_free_text_message() {
        let request = ChartRequest::from_message("1992-10-28, 22:30, Lexington, KY").unwrap();
        assert_eq!(request, ChartRequest::new("1992-10-28", "22:30", "Lexington, KY"));
    }

    #[test]
    fn test_unusable_messages() {
        assert_eq!(ChartRequest::from_message("hello there"), None);
        assert_eq!(ChartRequest::from_message(r#"{"type": "follow_up", "question": "why?"}"#), None);
        assert_eq!(ChartRequest::from_message(r#"{"type": "birth_data", "date": "1990-03-15"}"#), None);
    }

    #[test]
    fn test_options_fall_back_to_defaults() {
        let defaults = ChartOptions::default().house_system("koch");
        let mut request = ChartRequest::new("1990-03-15", "14:30", "Austin, TX");
        request.sidereal_mode = Some("raman".into());
        let options = request.options(&defaults);
        assert_eq!(options.house_system, "koch");
        assert_eq!(options.zodiac_type, "tropical");
        assert_eq!(options.sidereal_mode, "raman");
    }

    #[test]
    fn test_handle_attaches_transits() {
        let engine = fixture_engine();
        let mut request =
            ChartRequest::new("1990-03-15", "14:30", "Austin, TX").with_transit("2024-06-01", None);
        request.zodiac_type = Some("sidereal".into());
        request.sidereal_mode = Some("krishnamurti".into());

        let document = engine.handle(&request).unwrap();
        assert_eq!(document.chart.meta().sidereal_mode, Some(SiderealMode::Krishnamurti));
        assert_eq!(document.chart.meta().house_system, HouseSystem::Placidus);
        assert_eq!(document.transits.as_ref().unwrap().meta.time, "12:00");

        let doc = serde_json::to_value(&document).unwrap();
        assert!(doc["planets"]["Sun"].is_object());
        assert!(doc["transits"]["transit_planets"]["Moon"].is_object());
        assert!(doc["transits"]["transit_aspects"].is_array());

        let envelope = document.envelope().unwrap();
        assert_eq!(envelope["type"], "chart_result");
        assert_eq!(envelope["chart"]["meta"]["sidereal_mode"], "krishnamurti");
    }

    #[test]
    fn test_handle_without_transits() {
        let engine = fixture_engine();
        let document = engine
            .handle(&ChartRequest::new("1990-03-15", "14:30", "Austin, TX"))
            .unwrap();
        assert!(document.transits.is_none());
        let doc = serde_json::to_value(&document).unwrap();
        assert!(doc.get("transits").is_none());
        assert!(doc.get("meta").is_some());
    }

    #[test]
    fn test_handle_propagates_errors() {
        let engine = fixture_engine();
        let err = engine
            .handle(&ChartRequest::new("2000-01-01", "00:00", "Nonexistent Place Zzzzz"))
            .unwrap_err();
        assert!(matches!(err, ChartError::LocationNotFound(_)));
    }
}
