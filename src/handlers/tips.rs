use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use serde::Serialize;

use crate::errors::Result;
use crate::models::{
    extra::SubmitExtraTipsRequest,
    extra_tip::ExtraTip,
    game_tip::{GameTip, GameTipView, RejectedTip, SubmitGameTipsRequest, SubmitTipsResponse},
    user::Claims,
};
use crate::services::data_service::{self, find_all};
use crate::services::presentation;
use crate::services::tips as tip_rules;
use crate::state::AppState;

fn rejected(id: &str, reason: impl Into<String>) -> RejectedTip {
    RejectedTip {
        id: id.to_string(),
        reason: reason.into(),
    }
}

pub async fn submit_game_tips(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitGameTipsRequest>,
) -> Result<Json<SubmitTipsResponse>> {
    let db = &state.db;
    let user_id = claims.user_id()?;
    let settings = data_service::get_settings(db).await?;
    let now = Utc::now();

    let mut placed = 0;
    let mut rejections = Vec::new();

    for entry in payload.tips {
        let Ok(game_id) = data_service::parse_id(&entry.game) else {
            rejections.push(rejected(&entry.game, "unknown game"));
            continue;
        };
        let Some(game) = data_service::games(db).find_one(doc! { "_id": game_id }).await? else {
            rejections.push(rejected(&entry.game, "unknown game"));
            continue;
        };

        if let Err(rejection) = tip_rules::check_game_tip(&game, &settings, entry.home_score, entry.away_score, now) {
            rejections.push(rejected(&entry.game, rejection.reason()));
            continue;
        }

        let tip = GameTip {
            id: None,
            user_id,
            game_id,
            playday: game.playday,
            home_score: entry.home_score,
            away_score: entry.away_score,
            points: None,
            placed: BsonDateTime::now(),
        };
        data_service::game_tips(db)
            .replace_one(doc! { "user_id": user_id, "game_id": game_id }, &tip)
            .upsert(true)
            .await?;
        placed += 1;
    }

    tracing::info!(
        "{} placed {} game tips, {} rejected",
        claims.username,
        placed,
        rejections.len()
    );

    Ok(Json(SubmitTipsResponse {
        success: rejections.is_empty(),
        placed,
        rejected: rejections,
    }))
}

pub async fn submit_extra_tips(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitExtraTipsRequest>,
) -> Result<Json<SubmitTipsResponse>> {
    let db = &state.db;
    let user_id = claims.user_id()?;
    let now = Utc::now();

    let mut placed = 0;
    let mut rejections = Vec::new();

    for entry in payload.tips {
        let (Ok(extra_id), Ok(answer)) = (
            data_service::parse_id(&entry.extra),
            data_service::parse_id(&entry.answer),
        ) else {
            rejections.push(rejected(&entry.extra, "invalid id"));
            continue;
        };
        let Some(extra) = data_service::extras(db).find_one(doc! { "_id": extra_id }).await? else {
            rejections.push(rejected(&entry.extra, "unknown question"));
            continue;
        };

        if let Err(rejection) = tip_rules::check_extra_tip(&extra, answer, now) {
            rejections.push(rejected(&entry.extra, rejection.reason()));
            continue;
        }

        let tip = ExtraTip {
            id: None,
            user_id,
            extra_id,
            answer,
            points: None,
            placed: BsonDateTime::now(),
        };
        data_service::extra_tips(db)
            .replace_one(doc! { "user_id": user_id, "extra_id": extra_id }, &tip)
            .upsert(true)
            .await?;
        placed += 1;
    }

    Ok(Json(SubmitTipsResponse {
        success: rejections.is_empty(),
        placed,
        rejected: rejections,
    }))
}

#[derive(Debug, Serialize)]
pub struct GameTipsResponse {
    pub game: String,
    pub result: String,
    pub trend: String,
    pub tips: Vec<GameTipView>,
}

pub async fn game_tips(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<GameTipsResponse>> {
    let db = &state.db;
    let viewer = claims.user_id()?;
    let game = data_service::find_game(db, data_service::parse_id(&id)?).await?;
    let tips = find_all(&data_service::game_tips(db), doc! { "game_id": game.id }, doc! {}).await?;
    let users = find_all(&data_service::users(db), doc! { "active": true }, doc! { "place": 1, "username": 1 }).await?;
    let teams = data_service::team_names(db).await?;
    let brackets = data_service::all_brackets(db).await?;
    let now = Utc::now();

    let views = users
        .iter()
        .filter_map(|user| {
            let tip = tips.iter().find(|t| Some(t.user_id) == user.id)?;
            Some(GameTipView {
                username: user.username.clone(),
                tip: presentation::visible_tip(tip, &game, Some(viewer) == user.id, now),
                points: if game.ended { tip.points } else { None },
            })
        })
        .collect();

    Ok(Json(GameTipsResponse {
        game: presentation::game_title(&game, &teams, &brackets),
        result: presentation::result_text(&game),
        trend: presentation::tip_trend(&tips),
        tips: views,
    }))
}

#[derive(Debug, Serialize)]
pub struct MyTip {
    pub game_id: String,
    pub game: String,
    pub tip: String,
    pub result: String,
    pub points: Option<i32>,
    pub tippable: bool,
}

pub async fn my_tips(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(playday): Path<i32>,
) -> Result<Json<Vec<MyTip>>> {
    let db = &state.db;
    let user_id = claims.user_id()?;
    let settings = data_service::get_settings(db).await?;
    let games = find_all(&data_service::games(db), doc! { "playday": playday }, doc! { "kickoff": 1, "number": 1 }).await?;
    let tips = find_all(
        &data_service::game_tips(db),
        doc! { "user_id": user_id, "playday": playday },
        doc! {},
    )
    .await?;
    let teams = data_service::team_names(db).await?;
    let brackets = data_service::all_brackets(db).await?;
    let now = Utc::now();

    let response = games
        .iter()
        .map(|game| {
            let tip = tips.iter().find(|t| Some(t.game_id) == game.id);
            MyTip {
                game_id: game.id.map(|id| id.to_hex()).unwrap_or_default(),
                game: presentation::game_title(game, &teams, &brackets),
                tip: tip
                    .map(|t| presentation::visible_tip(t, game, true, now))
                    .unwrap_or_else(|| "-".to_string()),
                result: presentation::result_text(game),
                points: tip.and_then(|t| t.points),
                tippable: tip_rules::is_tippable(game, &settings, now),
            }
        })
        .collect();

    Ok(Json(response))
}
