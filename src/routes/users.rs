use axum::{
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};

use crate::handlers::users;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(users::profile))
        .route("/me/username", put(users::update_username))
        .route("/me/email", put(users::update_email))
        .route("/me/password", put(users::update_password))
        .route("/me/notifications", put(users::update_notifications))
        .route_layer(from_fn_with_state(state, auth_middleware))
        // public profile
        .route("/:username", get(users::show))
}
