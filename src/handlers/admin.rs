use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use mongodb::bson::doc;
use validator::Validate;

use crate::dtos::admin_dtos::{RudelmailRequest, RudelmailResponse, UpdateSettingsRequest};
use crate::dtos::auth_dtos::MessageResponse;
use crate::errors::{AppError, Result};
use crate::jobs::{self, JobKind};
use crate::models::{
    extra::SetAnswerRequest,
    game::{Game, GameResponse, SetResultRequest},
    job::JobDescriptor,
    settings::Settings,
    user::{Claims, ProfileResponse},
};
use crate::services::data_service::{self, find_all};
use crate::services::calculation_service;
use crate::state::AppState;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<ProfileResponse>>> {
    let users = find_all(&data_service::users(&state.db), doc! {}, doc! { "username": 1 }).await?;
    Ok(Json(users.iter().map(ProfileResponse::from).collect()))
}

/// Rejects actions an admin would apply to their own account.
fn other_user(claims: &Claims, id: &str) -> Result<mongodb::bson::oid::ObjectId> {
    let user_id = data_service::parse_id(id)?;
    if user_id == claims.user_id()? {
        return Err(AppError::invalid_data("You can not change your own account here"));
    }
    Ok(user_id)
}

async fn set_flag(state: &AppState, claims: &Claims, id: &str, field: &str, value: bool) -> Result<ProfileResponse> {
    let user_id = other_user(claims, id)?;
    let user = data_service::find_user(&state.db, user_id).await?;

    data_service::users(&state.db)
        .update_one(doc! { "_id": user_id }, doc! { "$set": { field: value } })
        .await?;
    tracing::info!("{} set {}={} on {}", claims.username, field, value, user.username);

    let user = data_service::find_user(&state.db, user_id).await?;
    Ok(ProfileResponse::from(&user))
}

pub async fn activate_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let profile = set_flag(&state, &claims, &id, "active", true).await?;
    calculation_service::calculate(&state).await?;
    Ok(Json(profile))
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let profile = set_flag(&state, &claims, &id, "active", false).await?;
    calculation_service::calculate(&state).await?;
    Ok(Json(profile))
}

pub async fn toggle_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let user_id = other_user(&claims, &id)?;
    let user = data_service::find_user(&state.db, user_id).await?;
    Ok(Json(set_flag(&state, &claims, &id, "admin", !user.admin).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let db = &state.db;
    let user_id = other_user(&claims, &id)?;
    let user = data_service::find_user(db, user_id).await?;

    let game_tips = data_service::game_tips(db).delete_many(doc! { "user_id": user_id }).await?;
    let extra_tips = data_service::extra_tips(db).delete_many(doc! { "user_id": user_id }).await?;
    data_service::confirmations(db).delete_many(doc! { "user_id": user_id }).await?;
    data_service::users(db).delete_one(doc! { "_id": user_id }).await?;

    tracing::info!(
        "User {} deleted by {} ({} game tips, {} extra tips)",
        user.username,
        claims.username,
        game_tips.deleted_count,
        extra_tips.deleted_count
    );

    calculation_service::calculate(&state).await?;
    Ok(Json(MessageResponse::ok(format!("User {} deleted.", user.username))))
}

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>> {
    Ok(Json(data_service::get_settings(&state.db).await?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<Settings>> {
    payload.validate()?;
    let recalculate = payload.changes_scoring();

    let mut settings = data_service::get_settings(&state.db).await?;
    payload.apply(&mut settings);
    data_service::settings(&state.db)
        .replace_one(doc! {}, &settings)
        .await?;
    tracing::info!("Settings updated");

    if recalculate {
        calculation_service::calculate(&state).await?;
    }
    Ok(Json(settings))
}

pub async fn set_game_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SetResultRequest>,
) -> Result<Json<GameResponse>> {
    let game: Game = calculation_service::set_game_result(&state, data_service::parse_id(&id)?, payload).await?;

    let db = &state.db;
    let tips = find_all(&data_service::game_tips(db), doc! { "game_id": game.id }, doc! {}).await?;
    let teams = data_service::team_names(db).await?;
    let brackets = data_service::all_brackets(db).await?;
    Ok(Json(super::tournament::game_response(game, &tips, &teams, &brackets)))
}

pub async fn set_extra_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SetAnswerRequest>,
) -> Result<Json<MessageResponse>> {
    let answer = data_service::parse_id(&payload.answer)?;
    calculation_service::set_extra_answer(&state, data_service::parse_id(&id)?, answer).await?;
    Ok(Json(MessageResponse::ok("Answer saved and points calculated.")))
}

pub async fn calculate(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    calculation_service::calculate(&state).await?;
    Ok(Json(MessageResponse::ok("Calculation finished.")))
}

pub async fn rudelmail(
    State(state): State<AppState>,
    Json(payload): Json<RudelmailRequest>,
) -> Result<Json<RudelmailResponse>> {
    payload.validate()?;
    let db = &state.db;
    let settings = data_service::get_settings(db).await?;

    let recipients: Vec<String> = data_service::active_users(db)
        .await?
        .into_iter()
        .map(|user| user.email)
        .collect();

    let sent = state
        .mail
        .rudelmail(&settings, &payload.subject, &payload.message, &recipients)
        .await?;
    tracing::info!("Rudelmail '{}' sent to {} recipients", payload.subject, sent);

    Ok(Json(RudelmailResponse {
        success: sent > 0,
        recipients: sent,
    }))
}

pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobDescriptor>>> {
    let jobs = find_all(&data_service::jobs(&state.db), doc! {}, doc! { "name": 1 }).await?;
    Ok(Json(jobs))
}

pub async fn toggle_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<JobDescriptor>> {
    let kind = JobKind::from_name(&name).ok_or(AppError::DocumentNotFound)?;
    let collection = data_service::jobs(&state.db);

    let descriptor = collection
        .find_one(doc! { "name": kind.name() })
        .await?
        .ok_or(AppError::DocumentNotFound)?;
    collection
        .update_one(
            doc! { "name": kind.name() },
            doc! { "$set": { "active": !descriptor.active } },
        )
        .await?;
    tracing::info!("Job {} is now {}", kind.name(), if descriptor.active { "inactive" } else { "active" });

    let descriptor = collection
        .find_one(doc! { "name": kind.name() })
        .await?
        .ok_or(AppError::DocumentNotFound)?;
    Ok(Json(descriptor))
}

pub async fn run_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>> {
    jobs::run_by_name(&state, &name).await?;
    Ok(Json(MessageResponse::ok(format!("Job {} executed.", name))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn claims(id: ObjectId) -> Claims {
        Claims {
            sub: id.to_hex(),
            username: "admin".to_string(),
            admin: true,
            exp: 0,
        }
    }

    #[test]
    fn refuses_changes_to_own_account() {
        let me = ObjectId::new();
        let other = ObjectId::new();

        assert!(matches!(other_user(&claims(me), &me.to_hex()), Err(AppError::ValidationError(_))));
        assert_eq!(other_user(&claims(me), &other.to_hex()).unwrap(), other);
        assert!(matches!(other_user(&claims(me), "nope"), Err(AppError::InvalidObjectId(_))));
    }
}
