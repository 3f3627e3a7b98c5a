use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::admin;
use crate::middleware::auth::{admin_middleware, auth_middleware};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Users
        .route("/users", get(admin::list_users))
        .route("/users/:id/activate", post(admin::activate_user))
        .route("/users/:id/deactivate", post(admin::deactivate_user))
        .route("/users/:id/admin", post(admin::toggle_admin))
        .route("/users/:id", delete(admin::delete_user))

        // Settings and results
        .route("/settings", get(admin::get_settings))
        .route("/settings", put(admin::update_settings))
        .route("/games/:id/result", put(admin::set_game_result))
        .route("/extras/:id/answer", put(admin::set_extra_answer))
        .route("/calculate", post(admin::calculate))
        .route("/rudelmail", post(admin::rudelmail))

        // Jobs
        .route("/jobs", get(admin::list_jobs))
        .route("/jobs/:name/toggle", post(admin::toggle_job))
        .route("/jobs/:name/run", post(admin::run_job))

        // the last layer runs first
        .route_layer(from_fn_with_state(state.clone(), admin_middleware))
        .route_layer(from_fn_with_state(state, auth_middleware))
}
