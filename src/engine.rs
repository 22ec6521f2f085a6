use crate::aspects::AspectTable;
use crate::chart::ChartOptions;
use crate::config::Settings;
use crate::transits::TransitFrame;

/// Owns the two providers and the aspect configuration.
///
/// The engine holds no per-chart state; every call to
/// [`build_chart`](ChartEngine::build_chart) or
/// [`compute_transits`](ChartEngine::compute_transits) recomputes from its
/// inputs, so one engine can serve concurrent requests when its providers can.
#[derive(Debug, Clone)]
pub struct ChartEngine<E, L> {
    pub(crate) ephemeris: E,
    pub(crate) locations: L,
    pub(crate) natal_aspects: AspectTable,
    pub(crate) transit_aspects: AspectTable,
    pub(crate) transit_frame: TransitFrame,
    pub(crate) default_transit_time: String,
    pub(crate) default_options: ChartOptions,
}

impl<E, L> ChartEngine<E, L> {
    pub fn new(ephemeris: E, locations: L) -> Self {
        ChartEngine {
            ephemeris,
            locations,
            natal_aspects: AspectTable::default(),
            transit_aspects: AspectTable::default(),
            transit_frame: TransitFrame::default(),
            default_transit_time: "12:00".to_string(),
            default_options: ChartOptions::default(),
        }
    }

    /// Applies the aspect tables, transit policy and chart defaults from `settings`.
    pub fn with_settings(self, settings: &Settings) -> Self {
        self.with_natal_aspects(settings.aspects.natal.clone())
            .with_transit_aspects(settings.aspects.transit.clone())
            .with_transit_frame(settings.transit.frame)
            .with_default_transit_time(&settings.transit.default_time)
            .with_default_options(settings.chart.clone())
    }

    pub fn with_natal_aspects(mut self, table: AspectTable) -> Self {
        self.natal_aspects = table;
        self
    }

    pub fn with_transit_aspects(mut self, table: AspectTable) -> Self {
        self.transit_aspects = table;
        self
    }

    pub fn with_transit_frame(mut self, frame: TransitFrame) -> Self {
        self.transit_frame = frame;
        self
    }

    pub fn with_default_transit_time(mut self, time: &str) -> Self {
        self.default_transit_time = time.to_string();
        self
    }

    pub fn with_default_options(mut self, options: ChartOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn ephemeris(&self) -> &E {
        &self.ephemeris
    }

    pub fn locations(&self) -> &L {
        &self.locations
    }

    /// Options used for requests that leave a field unset.
    pub fn default_options(&self) -> &ChartOptions {
        &self.default_options
    }

    pub fn natal_aspects(&self) -> &AspectTable {
        &self.natal_aspects
    }

    pub fn transit_aspects(&self) -> &AspectTable {
        &self.transit_aspects
    }

    pub fn transit_frame(&self) -> TransitFrame {
        self.transit_frame
    }
}
