// src/intake/resolver.rs
// Turn free text into a raw coordinate pair, locally or via the geocoder

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::geocode::{GeocodeCandidate, Geocoder};

// "lat lon": up to 2 integer digits for latitude, up to 3 for longitude
static LITERAL_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?\d{1,2}(?:\.\d+)?)\s+([+-]?\d{1,3}(?:\.\d+)?)\s*$")
        .expect("literal coordinate pattern is valid")
});

/// Unvalidated latitude/longitude text, as typed or as returned by the geocoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCoordinates {
    pub latitude: String,
    pub longitude: String,
}

/// Split text that already looks like a "lat lon" pair.
pub fn parse_literal_pair(text: &str) -> Option<RawCoordinates> {
    let caps = LITERAL_PAIR.captures(text)?;
    Some(RawCoordinates {
        latitude: caps[1].to_string(),
        longitude: caps[2].to_string(),
    })
}

/// Highest importance wins; ties go to the earliest candidate.
pub fn select_best(candidates: &[GeocodeCandidate]) -> Option<&GeocodeCandidate> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.importance <= current.importance => Some(current),
        Some(current) if candidate.importance.is_nan() => Some(current),
        _ => Some(candidate),
    })
}

#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Resolve `text` to coordinates. Any geocoder failure reads as "no result".
    pub async fn resolve(&self, text: &str) -> Option<RawCoordinates> {
        if let Some(pair) = parse_literal_pair(text) {
            debug!("Literal coordinates in input, skipping geocoder");
            return Some(pair);
        }

        let query = text.trim();
        if query.is_empty() {
            return None;
        }

        let candidates = match self.geocoder.search(query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Geocoding failed: {}", e);
                return None;
            }
        };

        let best = select_best(&candidates)?;
        debug!(importance = best.importance, "Selected geocoding candidate");
        Some(RawCoordinates {
            latitude: best.latitude.clone(),
            longitude: best.longitude.clone(),
        })
    }
}
