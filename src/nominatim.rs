//! Online place lookup through a Nominatim search endpoint, with timezones
//! from the bundled `tzf-rs` boundary data.

use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use tzf_rs::DefaultFinder;
use urlencoding::encode;

use crate::config::GeocoderSettings;
use crate::location::{Coordinates, LocationError, LocationResolver};

static TZ_FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

pub struct NominatimResolver {
    client: Client,
    endpoint: String,
}

impl NominatimResolver {
    pub fn new(settings: &GeocoderSettings) -> Result<Self, LocationError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LocationError::Service(e.to_string()))?;
        Ok(NominatimResolver {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }

    fn search_url(&self, place: &str) -> String {
        format!("{}?q={}&format=json&limit=1", self.endpoint, encode(place))
    }
}

fn first_hit(body: &str) -> Result<Coordinates, LocationError> {
    let hits: Vec<SearchHit> =
        serde_json::from_str(body).map_err(|e| LocationError::Service(format!("bad response: {}", e)))?;
    let hit = hits.into_iter().next().ok_or(LocationError::NotFound)?;
    let parse = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| LocationError::Service(format!("bad coordinate '{}'", value)))
    };
    debug!(name = %hit.display_name, "geocoded");
    Ok(Coordinates::new(parse(&hit.lat)?, parse(&hit.lon)?))
}

impl LocationResolver for NominatimResolver {
    fn resolve(&self, place: &str) -> Result<Coordinates, LocationError> {
        if place.trim().is_empty() {
            return Err(LocationError::NotFound);
        }
        let response = self
            .client
            .get(self.search_url(place))
            .send()
            .map_err(|e| LocationError::Service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocationError::Service(format!(
                "geocoder returned status {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .map_err(|e| LocationError::Service(e.to_string()))?;
        first_hit(&body)
    }

    fn timezone_at(&self, latitude: f64, longitude: f64) -> Result<String, LocationError> {
        let name = TZ_FINDER.get_tz_name(longitude, latitude);
        if name.is_empty() {
            Err(LocationError::NotFound)
        } else {
            Ok(name.to_string())
        }
    }
}
