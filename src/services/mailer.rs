use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mail {
    pub from: String,
    pub reply_to: String,
    pub to: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &Mail) -> Result<()>;
}

/// Delivers mails through a JSON mail API.
#[derive(Clone)]
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    client: Client,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, client: Client) -> Self {
        Self {
            api_url,
            api_key,
            client,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: &Mail) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(mail)
            .send()
            .await
            .map_err(|e| AppError::mail(format!("Mail API error: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::mail(format!(
                "Mail sending failed with status: {}",
                response.status()
            )))
        }
    }
}

/// Used when no mail API is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &Mail) -> Result<()> {
        tracing::info!(
            "Mail to {:?} (bcc {}): {}\n{}",
            mail.to,
            mail.bcc.len(),
            mail.subject,
            mail.body
        );
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryMailer {
    pub sent: std::sync::Mutex<Vec<Mail>>,
}

#[cfg(test)]
impl MemoryMailer {
    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: &Mail) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail.clone());
        }
        Ok(())
    }
}
