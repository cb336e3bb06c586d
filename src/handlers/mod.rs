//! HTTP surface: one router per resource, assembled here.

pub mod cart;
pub mod orders;
pub mod payment;
pub mod products;
pub mod reviews;

use axum::{routing::get, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/payment", payment::router())
        .nest("/orders", orders::router())
        .nest("/reviews", reviews::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn welcome() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "message": "Welcome to the E-commerce API" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "storefront" }))
}
