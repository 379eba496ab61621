// src/lib.rs

pub mod api;
pub mod bot;
pub mod config;
pub mod features;
pub mod geocode;
pub mod intake;
pub mod model;
pub mod state;
pub mod trip;

pub use state::AppState;
