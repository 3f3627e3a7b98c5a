use axum::{http::Method, Router};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod database;
mod dtos;
mod errors;
mod handlers;
mod jobs;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use config::AppConfig;
use database::connection::{create_indexes, get_db_client};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let db = get_db_client(&config).await?;
    create_indexes(&db).await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app_state = AppState::new(db, config);

    if app_state.config.job_instance {
        jobs::start_scheduler(app_state.clone());
    } else {
        tracing::info!("Not a job instance, scheduler disabled");
    }

    let app = build_router(app_state);

    tracing::info!("Rudeltippen listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .nest("/api/system", routes::system::routes())
        .nest("/api/auth", routes::auth::routes())
        .nest("/api/users", routes::users::routes(app_state.clone()))
        .nest("/api/tournament", routes::tournament::routes())
        .nest("/api/tips", routes::tips::routes(app_state.clone()))
        .nest("/api", routes::application::routes(app_state.clone()))
        .nest("/api/admin", routes::admin::routes(app_state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(app_state)
}
