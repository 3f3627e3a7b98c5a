use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::doc;
use serde::Serialize;

use crate::errors::{AppError, Result};
use crate::models::{
    bracket::{Bracket, BracketResponse},
    extra::Extra,
    game::{Game, GameResponse},
    game_tip::GameTip,
    playday::{Playday, PlaydayResponse},
};
use crate::services::data_service::{self, find_all};
use crate::services::presentation::{self, TeamNames};
use crate::state::AppState;

pub(crate) fn game_response(game: Game, tips: &[GameTip], teams: &TeamNames, brackets: &[Bracket]) -> GameResponse {
    let now = Utc::now();
    GameResponse {
        home_name: presentation::side_name(game.home_team, game.home_reference.as_deref(), teams, brackets),
        away_name: presentation::side_name(game.away_team, game.away_reference.as_deref(), teams, brackets),
        result: presentation::result_text(&game),
        kickoff_in: presentation::difference(now, game.kickoff.to_chrono()),
        trend: presentation::tip_trend(tips),
        game,
    }
}

pub async fn list_playdays(State(state): State<AppState>) -> Result<Json<Vec<Playday>>> {
    Ok(Json(data_service::all_playdays(&state.db).await?))
}

pub(crate) async fn playday_with_games(state: &AppState, playday: Playday) -> Result<PlaydayResponse> {
    let db = &state.db;
    let games = find_all(
        &data_service::games(db),
        doc! { "playday": playday.number },
        doc! { "kickoff": 1, "number": 1 },
    )
    .await?;

    let ids: Vec<_> = games.iter().filter_map(|g| g.id).collect();
    let tips = find_all(&data_service::game_tips(db), doc! { "game_id": { "$in": ids } }, doc! {}).await?;
    let teams = data_service::team_names(db).await?;
    let brackets = data_service::all_brackets(db).await?;

    let games = games
        .into_iter()
        .map(|game| {
            let game_tips: Vec<GameTip> = tips.iter().filter(|t| Some(t.game_id) == game.id).cloned().collect();
            game_response(game, &game_tips, &teams, &brackets)
        })
        .collect();

    Ok(PlaydayResponse { playday, games })
}

pub async fn get_playday(
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> Result<Json<PlaydayResponse>> {
    let playday = data_service::playdays(&state.db)
        .find_one(doc! { "number": number })
        .await?
        .ok_or(AppError::DocumentNotFound)?;
    Ok(Json(playday_with_games(&state, playday).await?))
}

pub async fn current_playday(State(state): State<AppState>) -> Result<Json<PlaydayResponse>> {
    let playday = data_service::current_playday(&state.db)
        .await?
        .ok_or(AppError::DocumentNotFound)?;
    Ok(Json(playday_with_games(&state, playday).await?))
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>> {
    let db = &state.db;
    let game = data_service::find_game(db, data_service::parse_id(&id)?).await?;
    let tips = find_all(&data_service::game_tips(db), doc! { "game_id": game.id }, doc! {}).await?;
    let teams = data_service::team_names(db).await?;
    let brackets = data_service::all_brackets(db).await?;

    Ok(Json(game_response(game, &tips, &teams, &brackets)))
}

pub async fn list_brackets(State(state): State<AppState>) -> Result<Json<Vec<BracketResponse>>> {
    let db = &state.db;
    let brackets = data_service::all_brackets(db).await?;
    let teams = data_service::all_teams(db).await?;

    let response = brackets
        .into_iter()
        .map(|bracket| {
            let mut members: Vec<_> = teams
                .iter()
                .filter(|t| t.bracket == Some(bracket.number))
                .cloned()
                .collect();
            members.sort_by_key(|t| t.place);
            BracketResponse {
                number: bracket.number,
                name: bracket.name,
                teams: members,
            }
        })
        .collect();

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct ExtraResponse {
    #[serde(flatten)]
    pub extra: Extra,
    pub answer_names: Vec<String>,
    pub ending_in: String,
}

pub async fn list_extras(State(state): State<AppState>) -> Result<Json<Vec<ExtraResponse>>> {
    let db = &state.db;
    let teams = data_service::team_names(db).await?;
    let now = Utc::now();

    let extras: Vec<Extra> = data_service::extras(db)
        .find(doc! {})
        .sort(doc! { "ending": 1 })
        .await?
        .try_collect()
        .await?;

    let response = extras
        .into_iter()
        .map(|extra| ExtraResponse {
            answer_names: extra
                .answers
                .iter()
                .filter_map(|id| teams.get(id).cloned())
                .collect(),
            ending_in: presentation::difference(now, extra.ending.to_chrono()),
            extra,
        })
        .collect();

    Ok(Json(response))
}
