// src/state.rs
// Shared application state, assembled once at startup

use std::sync::Arc;

use crate::bot::Bot;
use crate::config::FareConfig;
use crate::geocode::Geocoder;
use crate::intake::resolver::LocationResolver;
use crate::model::{FareModel, FarePredictor};

#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Bot>,
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        model: Arc<dyn FareModel>,
        webhook_secret: Option<String>,
    ) -> Self {
        let resolver = LocationResolver::new(geocoder);
        let predictor = FarePredictor::new(model);
        Self {
            bot: Arc::new(Bot::new(resolver, predictor)),
            webhook_secret,
        }
    }

    pub fn from_config(
        config: &FareConfig,
        geocoder: Arc<dyn Geocoder>,
        model: Arc<dyn FareModel>,
    ) -> Self {
        Self::new(geocoder, model, config.webhook_secret().map(str::to_string))
    }
}
