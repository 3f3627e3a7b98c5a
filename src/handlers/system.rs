use axum::{extract::State, response::Json};
use mongodb::bson::doc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::Result;
use crate::models::settings::Settings;
use crate::services::{data_service, import_service};
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.db.run_command(doc! { "ping": 1 }).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "job_instance": state.config.job_instance,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Serialize)]
pub struct SetupResponse {
    pub initialized: bool,
}

pub async fn setup(State(state): State<AppState>) -> Result<Json<SetupResponse>> {
    Ok(Json(SetupResponse {
        initialized: data_service::is_initialized(&state.db).await?,
    }))
}

pub async fn init(State(state): State<AppState>) -> Result<Json<Settings>> {
    let settings = import_service::initialize(&state).await?;
    Ok(Json(settings))
}
