// src/api/mod.rs

pub mod error;
pub mod http;

pub use http::{http_router, BotResponse};
