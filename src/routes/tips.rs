use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::handlers::tips;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/games", post(tips::submit_game_tips))
        .route("/extras", post(tips::submit_extra_tips))
        .route("/games/:id", get(tips::game_tips))
        .route("/playdays/:number", get(tips::my_tips))
        .route_layer(from_fn_with_state(state, auth_middleware))
}
