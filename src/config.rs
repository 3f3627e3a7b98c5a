// config.rs
use std::env;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub app_url: String,
    pub job_instance: bool,
    pub data_dir: String,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
    pub mail_api_url: Option<String>,
    pub mail_api_key: String,
    pub mail_from: String,
    pub mail_reply_to: String,
    pub openliga_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = AppConfig {
            database_url: required("DATABASE_URL")?,
            database_name: optional("DATABASE_NAME", "rudeltippen"),
            host: optional("HOST", "0.0.0.0"),
            port: parsed("PORT", 9000)?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_ttl_hours: parsed("JWT_TTL_HOURS", 24)?,
            app_url: optional("APP_URL", "http://localhost:9000"),
            job_instance: parsed("JOB_INSTANCE", false)?,
            data_dir: optional("DATA_DIR", "data"),
            admin_username: optional("ADMIN_USERNAME", "admin"),
            admin_email: optional("ADMIN_EMAIL", "admin@rudeltippen.local"),
            admin_password: required("ADMIN_PASSWORD")?,
            mail_api_url: env::var("MAIL_API_URL").ok().filter(|url| !url.trim().is_empty()),
            mail_api_key: optional("MAIL_API_KEY", ""),
            mail_from: optional("MAIL_FROM", "noreply@rudeltippen.local"),
            mail_reply_to: optional("MAIL_REPLY_TO", "noreply@rudeltippen.local"),
            openliga_url: optional("OPENLIGA_URL", "https://api.openligadb.de"),
        };

        tracing::info!(
            "Configuration loaded: database={}, port={}, job_instance={}",
            config.database_name,
            config.port,
            config.job_instance
        );

        Ok(config)
    }

    pub fn confirm_url(&self, token: &str) -> String {
        format!("{}/confirm/{}", self.app_url.trim_end_matches('/'), token)
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| AppError::configuration(format!("{} must be set", key)))
}

fn optional(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::configuration(format!("{} has an invalid value: {}", key, value))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        AppConfig {
            database_url: "mongodb://localhost:27017".to_string(),
            database_name: "rudeltippen_test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 9000,
            jwt_secret: "test-secret".to_string(),
            jwt_ttl_hours: 24,
            app_url: "http://localhost:9000/".to_string(),
            job_instance: false,
            data_dir: "data".to_string(),
            admin_username: "admin".to_string(),
            admin_email: "admin@rudeltippen.de".to_string(),
            admin_password: "admin123".to_string(),
            mail_api_url: None,
            mail_api_key: String::new(),
            mail_from: "noreply@rudeltippen.de".to_string(),
            mail_reply_to: "reply@rudeltippen.de".to_string(),
            openliga_url: "https://api.openligadb.de".to_string(),
        }
    }
}
