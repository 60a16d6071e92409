pub mod health;
pub mod letters;
pub mod payments;
pub mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Multipart uploads are capped at 10 MB.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/upload", post(uploads::upload_handler))
        .route("/generate-letter", post(letters::generate_letter_handler))
        .route("/initialize-payment", post(payments::initialize_payment_handler))
        .route("/verify-payment", get(payments::verify_payment_handler))
        .route("/dashboard/:user_id", get(letters::dashboard_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
