// src/geocode/mod.rs
// Address search against the geocode.maps.co API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::FareConfig;

/// One ranked match for an address query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    #[serde(rename = "lat")]
    pub latitude: String,
    #[serde(rename = "lon")]
    pub longitude: String,
    pub importance: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Geocoding API returned status {0}")]
    Status(u16),

    #[error("Failed to decode geocoding response: {0}")]
    Decode(String),
}

/// Address-to-coordinates lookup
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// One request per call, no retries.
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError>;
}

/// HTTP client for the search endpoint. Holds one reusable connection pool.
#[derive(Clone)]
pub struct GeocodeClient {
    http_client: Client,
    search_url: String,
    api_key: String,
}

impl GeocodeClient {
    pub fn new(
        search_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taxi-fare-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            search_url: search_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &FareConfig) -> Result<Self, GeocodeError> {
        Self::new(
            config.geocode_search_url(),
            config.geocode_api_key.clone(),
            config.geocode_timeout(),
        )
    }
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let response = self
            .http_client
            .get(&self.search_url)
            .query(&[("api_key", self.api_key.as_str()), ("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let candidates: Vec<GeocodeCandidate> =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Decode(e.to_string()))?;

        debug!("Geocoding returned {} candidates", candidates.len());
        Ok(candidates)
    }
}
