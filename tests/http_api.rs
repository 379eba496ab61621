// tests/http_api.rs
// Webhook router exercised in-process with tower's oneshot

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use taxi_fare_bot::api::{http_router, BotResponse};
use taxi_fare_bot::features::FeatureVector;
use taxi_fare_bot::geocode::{GeocodeCandidate, GeocodeError, Geocoder};
use taxi_fare_bot::model::{FareModel, ModelError};
use taxi_fare_bot::AppState;

struct NoGeocoder;

#[async_trait]
impl Geocoder for NoGeocoder {
    async fn search(&self, _query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        Err(GeocodeError::Status(503))
    }
}

struct FlatFare;

impl FareModel for FlatFare {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(12.3456)
    }

    fn name(&self) -> &str {
        "flat"
    }
}

fn state(secret: Option<&str>) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(NoGeocoder),
        Arc::new(FlatFare),
        secret.map(str::to_string),
    ))
}

fn bot_request(body: Value, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/bot")
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-telegram-bot-api-secret-token", secret);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check() {
    let app = http_router(state(None));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn full_conversation_over_http() {
    let app_state = state(Some("s3cret"));
    let steps = [
        json!({"chat_id": "77", "text": "/single_prediction"}),
        json!({"chat_id": "77", "text": "40.712776 -74.005974"}),
        json!({"chat_id": "77", "location": {"latitude": 40.730610, "longitude": -73.935242}}),
        json!({"chat_id": "77", "callback_data": "passengers:2"}),
    ];

    for step in steps {
        let response = http_router(app_state.clone())
            .oneshot(bot_request(step, Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let last_step = json!({"chat_id": "77", "text": "2023-06-15 14:30:00"});
    let response = http_router(app_state.clone())
        .oneshot(bot_request(last_step, Some("s3cret")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: BotResponse = read_json(response).await;
    assert_eq!(body.replies.len(), 1);
    assert_eq!(body.replies[0].text, "Trip fare: 12.35");
}

#[tokio::test]
async fn passenger_prompt_carries_choices() {
    let app_state = state(None);
    for text in ["/single_prediction", "40.712776 -74.005974"] {
        http_router(app_state.clone())
            .oneshot(bot_request(json!({"chat_id": "5", "text": text}), None))
            .await
            .unwrap();
    }

    let response = http_router(app_state)
        .oneshot(bot_request(json!({"chat_id": "5", "text": "40.730610 -73.935242"}), None))
        .await
        .unwrap();
    let body: BotResponse = read_json(response).await;
    let choices = &body.replies[0].choices;
    assert_eq!(choices.len(), 6);
    assert_eq!(choices[1].data, "passengers:2");
}

#[tokio::test]
async fn wrong_secret_is_unauthorized() {
    let response = http_router(state(Some("s3cret")))
        .oneshot(bot_request(json!({"chat_id": "1", "text": "/help"}), Some("guess")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = read_json(response).await;
    assert_eq!(body["error_code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn malformed_payloads_are_bad_requests() {
    let app_state = state(None);

    let request = Request::builder()
        .method("POST")
        .uri("/bot")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = http_router(app_state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = http_router(app_state)
        .oneshot(bot_request(json!({"chat_id": "  ", "text": "/help"}), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
