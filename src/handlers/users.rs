use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use mongodb::bson::doc;
use serde::Serialize;
use validator::Validate;

use crate::dtos::auth_dtos::{
    MessageResponse, UpdateEmailRequest, UpdateNotificationsRequest, UpdatePasswordRequest,
    UpdateUsernameRequest,
};
use crate::errors::{AppError, Result};
use crate::models::confirmation::{Confirmation, ConfirmationType};
use crate::models::user::{AuthResponse, Claims, ProfileResponse, User, UserResponse};
use crate::services::data_service::{self, find_all};
use crate::services::{auth_service, presentation, validation};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserStatistics {
    pub extras: u64,
    pub correct_extra_tips: i32,
    pub games: u64,
    pub tips: usize,
    pub scored_tips: usize,
    pub correct_results: i32,
    pub correct_differences: i32,
    pub correct_trends: i32,
    pub points_per_tip: String,
    pub tip_quote: i32,
}

#[derive(Debug, Serialize)]
pub struct ShowUserResponse {
    pub user: UserResponse,
    pub statistics: UserStatistics,
}

async fn current_user(state: &AppState, claims: &Claims) -> Result<User> {
    data_service::find_user(&state.db, claims.user_id()?).await
}

pub async fn show(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ShowUserResponse>> {
    let db = &state.db;
    let user = data_service::find_user_by_username(db, &username)
        .await?
        .filter(|u| u.active)
        .ok_or(AppError::DocumentNotFound)?;
    let user_id = user.id.ok_or(AppError::DocumentNotFound)?;

    let tips = find_all(&data_service::game_tips(db), doc! { "user_id": user_id }, doc! {}).await?;
    let scored_tips = tips.iter().filter(|t| t.points.is_some()).count();

    let statistics = UserStatistics {
        extras: data_service::extras(db).count_documents(doc! {}).await?,
        correct_extra_tips: user.correct_extra_tips,
        games: data_service::games(db).count_documents(doc! {}).await?,
        tips: tips.len(),
        scored_tips,
        correct_results: user.correct_results,
        correct_differences: user.correct_differences,
        correct_trends: user.correct_trends,
        points_per_tip: presentation::points_per_tip(user.tip_points, scored_tips),
        tip_quote: presentation::tip_quote(user.correct_results, scored_tips),
    };

    Ok(Json(ShowUserResponse {
        user: UserResponse::from(&user),
        statistics,
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>> {
    let user = current_user(&state, &claims).await?;
    Ok(Json(ProfileResponse::from(&user)))
}

pub async fn update_username(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateUsernameRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;
    validation::check_username(&payload.username)?;

    let user = current_user(&state, &claims).await?;
    if let Some(existing) = data_service::find_user_by_username(&state.db, &payload.username).await? {
        if existing.id != user.id {
            return Err(AppError::DuplicateKey("Username already taken".to_string()));
        }
    }

    data_service::users(&state.db)
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": { "username": &payload.username } },
        )
        .await?;
    tracing::info!("User {} renamed to {}", user.username, payload.username);

    // the old token still names the old user
    let user = current_user(&state, &claims).await?;
    Ok(Json(auth_service::session(&user, &state.config)?))
}

pub async fn update_email(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateEmailRequest>,
) -> Result<Json<MessageResponse>> {
    payload.validate()?;
    validation::check_email(&payload.email)?;

    let user = current_user(&state, &claims).await?;
    if data_service::find_user_by_email(&state.db, &payload.email).await?.is_some() {
        return Err(AppError::DuplicateKey("E-mail address already registered".to_string()));
    }

    let user_id = claims.user_id()?;
    let confirmation = Confirmation::new(user_id, ConfirmationType::ChangeUsername, Some(payload.email.clone()));
    data_service::confirmations(&state.db).insert_one(&confirmation).await?;

    // the link goes to the new address
    let mut recipient = user.clone();
    recipient.email = payload.email;
    let settings = data_service::get_settings(&state.db).await?;
    state
        .mail
        .confirm(&settings, &recipient, &confirmation.token, ConfirmationType::ChangeUsername)
        .await?;

    Ok(Json(MessageResponse::ok("Please confirm your new e-mail address.")))
}

pub async fn update_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    payload.validate()?;
    validation::check_password(&payload.password)?;

    let user = current_user(&state, &claims).await?;
    let confirmation = Confirmation::new(
        claims.user_id()?,
        ConfirmationType::ChangeUserpass,
        Some(auth_service::hash_password(&payload.password)?),
    );
    data_service::confirmations(&state.db).insert_one(&confirmation).await?;

    let settings = data_service::get_settings(&state.db).await?;
    state
        .mail
        .confirm(&settings, &user, &confirmation.token, ConfirmationType::ChangeUserpass)
        .await?;

    Ok(Json(MessageResponse::ok("Please confirm your new password.")))
}

pub async fn update_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateNotificationsRequest>,
) -> Result<Json<ProfileResponse>> {
    data_service::users(&state.db)
        .update_one(
            doc! { "_id": claims.user_id()? },
            doc! { "$set": {
                "reminder": payload.reminder,
                "notification": payload.notification,
                "send_standings": payload.send_standings,
                "send_game_tips": payload.send_game_tips,
            } },
        )
        .await?;

    let user = current_user(&state, &claims).await?;
    Ok(Json(ProfileResponse::from(&user)))
}
