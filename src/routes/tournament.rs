use axum::{routing::get, Router};

use crate::handlers::tournament;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/playdays", get(tournament::list_playdays))
        .route("/playdays/current", get(tournament::current_playday))
        .route("/playdays/:number", get(tournament::get_playday))
        .route("/games/:id", get(tournament::get_game))
        .route("/brackets", get(tournament::list_brackets))
        .route("/extras", get(tournament::list_extras))
}
