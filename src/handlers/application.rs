use axum::{
    extract::{Query, State},
    response::Json,
    Extension,
};
use futures_util::TryStreamExt;
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::{
    playday::PlaydayResponse,
    settings::RulesResponse,
    user::{Claims, User, UserResponse},
};
use crate::services::data_service::{self, find_all};
use crate::services::presentation::{self, Pagination};
use crate::services::scoring::PointRules;
use crate::services::standings;
use crate::services::statistics::{self, StatisticsResponse};
use crate::state::AppState;

const TOP_USERS: usize = 5;

fn by_place() -> mongodb::bson::Document {
    doc! { "place": 1, "username": 1 }
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub top: Vec<UserResponse>,
    pub users: u64,
    pub diff_to_top: String,
    pub playday: Option<PlaydayResponse>,
}

pub async fn index(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<IndexResponse>> {
    let db = &state.db;
    let users = find_all(&data_service::users(db), doc! { "active": true }, by_place()).await?;
    let me = data_service::find_user(db, claims.user_id()?).await?;

    let playday = match data_service::current_playday(db).await? {
        Some(playday) => Some(super::tournament::playday_with_games(&state, playday).await?),
        None => None,
    };

    Ok(Json(IndexResponse {
        top: users.iter().take(TOP_USERS).map(UserResponse::from).collect(),
        users: users.len() as u64,
        diff_to_top: presentation::diff_to_top(standings::points_to_first_place(&users, &me)),
        playday,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StandingsQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StandingsResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

pub async fn standings(
    State(state): State<AppState>,
    Query(query): Query<StandingsQuery>,
) -> Result<Json<StandingsResponse>> {
    let collection = data_service::users(&state.db);
    let rows = collection.count_documents(doc! { "active": true }).await?;
    let pagination = presentation::pagination(rows as i64, query.page);

    let users: Vec<User> = collection
        .find(doc! { "active": true })
        .sort(by_place())
        .skip(pagination.from as u64)
        .limit(pagination.fetch)
        .await?
        .try_collect()
        .await?;

    Ok(Json(StandingsResponse {
        users: users.iter().map(UserResponse::from).collect(),
        pagination,
    }))
}

pub async fn statistics(State(state): State<AppState>) -> Result<Json<StatisticsResponse>> {
    let db = &state.db;
    let settings = data_service::get_settings(db).await?;
    let games = find_all(&data_service::games(db), doc! { "ended": true }, doc! { "number": 1 }).await?;
    let tips = find_all(&data_service::game_tips(db), doc! {}, doc! {}).await?;

    Ok(Json(StatisticsResponse {
        playdays: statistics::playday_statistics(&games, &tips, &PointRules::from(&settings)),
        results: statistics::game_results(&games),
        tipped_results: statistics::tipped_results(&tips),
    }))
}

pub async fn rules(State(state): State<AppState>) -> Result<Json<RulesResponse>> {
    let settings = data_service::get_settings(&state.db).await?;
    Ok(Json(RulesResponse::from(&settings)))
}
