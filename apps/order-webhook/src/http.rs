use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::pipeline::OrderPipeline;

pub const ORDER_UPDATED_PATH: &str = "/webhook/order-updated";
pub const HEALTH_PATH: &str = "/healthz";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<OrderPipeline>,
}

pub fn build_router(pipeline: Arc<OrderPipeline>) -> Router {
    Router::new()
        .route(ORDER_UPDATED_PATH, post(order_updated))
        .route(HEALTH_PATH, get(healthz))
        .with_state(AppState { pipeline })
}

// Shopify retries anything but a 2xx, so every outcome is acknowledged.
async fn order_updated(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = state.pipeline.handle_body(&body).await;
    (StatusCode::OK, outcome.as_str()).into_response()
}

async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}
