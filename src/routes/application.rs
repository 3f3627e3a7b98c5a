use axum::{
    middleware::from_fn_with_state,
    routing::get,
    Router,
};

use crate::handlers::application;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/index", get(application::index))
        .route_layer(from_fn_with_state(state, auth_middleware))
        .route("/standings", get(application::standings))
        .route("/statistics", get(application::statistics))
        .route("/rules", get(application::rules))
}
