use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::system;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .route("/setup", get(system::setup))
        .route("/init", post(system::init))
}
