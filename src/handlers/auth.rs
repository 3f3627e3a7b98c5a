use axum::{
    extract::{Path, State},
    response::Json,
};
use mongodb::bson::doc;
use validator::Validate;

use crate::dtos::auth_dtos::{ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest};
use crate::errors::{AppError, Result};
use crate::models::confirmation::{Confirmation, ConfirmationType};
use crate::models::user::{AuthResponse, User};
use crate::services::{auth_service, calculation_service, data_service, validation};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>> {
    let db = &state.db;
    let settings = data_service::get_settings(db).await?;
    if !settings.enable_registration {
        return Err(AppError::RegistrationDisabled);
    }

    payload.validate()?;
    validation::check_username(&payload.username)?;
    validation::check_email(&payload.email)?;

    let filter = doc! {
        "$or": [
            { "username": &payload.username },
            { "email": &payload.email }
        ]
    };
    if data_service::users(db).find_one(filter).await?.is_some() {
        return Err(AppError::DuplicateKey("Username or e-mail already registered".to_string()));
    }

    let user = User::new_tipper(
        &payload.username,
        &payload.email,
        auth_service::hash_password(&payload.password)?,
        auth_service::gravatar_url(&payload.email),
    );
    let user_id = user.id.ok_or_else(|| AppError::internal_server_error("New user has no id"))?;
    data_service::users(db).insert_one(&user).await?;

    let confirmation = Confirmation::new(user_id, ConfirmationType::Activation, None);
    data_service::confirmations(db).insert_one(&confirmation).await?;

    tracing::info!("User registered: {}", user.username);

    if let Err(e) = state
        .mail
        .confirm(&settings, &user, &confirmation.token, ConfirmationType::Activation)
        .await
    {
        tracing::error!("Activation mail to {} failed: {}", user.username, e);
    }

    if settings.inform_on_new_tipper {
        for admin in data_service::admins(db).await? {
            if let Err(e) = state.mail.new_user(&settings, &user, &admin).await {
                tracing::error!("New tipper mail to {} failed: {}", admin.username, e);
            }
        }
    }

    Ok(Json(MessageResponse::ok(
        "Registration successful. Please check your e-mail to activate your account.",
    )))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;

    let user = data_service::find_user_by_username(&state.db, &payload.username)
        .await?
        .ok_or(AppError::AuthError)?;

    if !user.active {
        return Err(AppError::AuthError);
    }
    if !auth_service::verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::AuthError);
    }

    let session = auth_service::session(&user, &state.config)?;
    tracing::info!("User logged in: {}", user.username);

    Ok(Json(session))
}

pub async fn confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>> {
    let db = &state.db;
    let confirmation = data_service::confirmations(db)
        .find_one(doc! { "token": &token })
        .await?
        .ok_or(AppError::DocumentNotFound)?;
    let user = data_service::find_user(db, confirmation.user_id).await?;

    let value = || {
        confirmation
            .confirm_value
            .clone()
            .ok_or_else(|| AppError::invalid_data("Confirmation has no value"))
    };

    let (update, message) = match confirmation.confirm_type {
        ConfirmationType::Activation => (doc! { "active": true }, "Your account is now active."),
        ConfirmationType::ChangeUsername => {
            let email = value()?;
            let update = doc! { "email": &email, "avatar": auth_service::gravatar_url(&email) };
            (update, "Your e-mail address was changed.")
        }
        ConfirmationType::ChangeUserpass => (doc! { "password_hash": value()? }, "Your password was changed."),
        ConfirmationType::NewUserpass => (doc! { "password_hash": value()? }, "Your new password is active."),
    };

    data_service::users(db)
        .update_one(doc! { "_id": confirmation.user_id }, doc! { "$set": update })
        .await?;
    data_service::confirmations(db)
        .delete_one(doc! { "token": &token })
        .await?;

    tracing::info!("Confirmation {:?} done for {}", confirmation.confirm_type, user.username);

    // a new tipper needs a place before showing up in the standings
    if confirmation.confirm_type == ConfirmationType::Activation {
        calculation_service::calculate(&state).await?;
    }
    Ok(Json(MessageResponse::ok(message)))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    payload.validate()?;
    let db = &state.db;
    let response = MessageResponse::ok("If the address is registered, a confirmation mail was sent.");

    let Some(user) = data_service::find_user_by_email(db, &payload.email).await? else {
        return Ok(Json(response));
    };
    let Some(user_id) = user.id.filter(|_| user.active) else {
        return Ok(Json(response));
    };

    let confirmation = Confirmation::new(
        user_id,
        ConfirmationType::NewUserpass,
        Some(auth_service::hash_password(&payload.password)?),
    );
    data_service::confirmations(db).insert_one(&confirmation).await?;

    let settings = data_service::get_settings(db).await?;
    state
        .mail
        .confirm(&settings, &user, &confirmation.token, ConfirmationType::NewUserpass)
        .await?;

    Ok(Json(response))
}
