use std::sync::Arc;

use mongodb::Database;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::services::mail_service::MailService;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub mail: MailService,
    pub http: reqwest::Client,
    /// Serializes recalculations so concurrent results can't interleave writes.
    pub calculation_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let config = Arc::new(config);
        let http = reqwest::Client::new();
        AppState {
            db,
            mail: MailService::from_config(config.clone(), http.clone()),
            config,
            http,
            calculation_lock: Arc::new(Mutex::new(())),
        }
    }
}
