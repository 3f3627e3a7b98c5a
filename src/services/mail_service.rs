//! Composes the application's mails and hands them to a [`Mailer`].
//!
//! Every subject carries the `[<game name>] ` prefix. Recipients with an
//! invalid address are logged and skipped instead of failing the caller.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::{
    bracket::Bracket, confirmation::ConfirmationType, extra::Extra, game::Game, settings::Settings,
    team::Team, user::User,
};
use crate::services::mailer::{HttpMailer, LogMailer, Mail, Mailer};
use crate::services::presentation::{self, TeamNames};
use crate::services::validation::is_valid_email;

/// One line of a game tips overview: who tipped what on which game.
#[derive(Debug, Clone)]
pub struct TipLine {
    pub game: String,
    pub username: String,
    pub tip: String,
}

#[derive(Clone)]
pub struct MailService {
    mailer: Arc<dyn Mailer>,
    from: String,
    reply_to: String,
    config: Arc<AppConfig>,
}

impl MailService {
    pub fn new(mailer: Arc<dyn Mailer>, config: Arc<AppConfig>) -> Self {
        Self {
            mailer,
            from: config.mail_from.clone(),
            reply_to: config.mail_reply_to.clone(),
            config,
        }
    }

    /// HTTP delivery when `MAIL_API_URL` is set, otherwise mails are only logged.
    pub fn from_config(config: Arc<AppConfig>, client: reqwest::Client) -> Self {
        let mailer: Arc<dyn Mailer> = match &config.mail_api_url {
            Some(url) => {
                tracing::info!("Mail delivery via {}", url);
                Arc::new(HttpMailer::new(url.clone(), config.mail_api_key.clone(), client))
            }
            None => {
                tracing::warn!("MAIL_API_URL not set, mails will only be logged");
                Arc::new(LogMailer)
            }
        };
        Self::new(mailer, config)
    }

    fn subject(settings: &Settings, subject: &str) -> String {
        format!("[{}] {}", settings.game_name, subject)
    }

    async fn send_to(&self, settings: &Settings, recipient: &str, subject: &str, body: String) -> Result<bool> {
        if !is_valid_email(recipient) {
            tracing::error!("Tried to send '{}', but recipient '{}' was invalid", subject, recipient);
            return Ok(false);
        }

        let mail = Mail {
            from: self.from.clone(),
            reply_to: self.reply_to.clone(),
            to: vec![recipient.to_string()],
            bcc: Vec::new(),
            subject: Self::subject(settings, subject),
            body,
        };
        self.mailer.send(&mail).await?;
        Ok(true)
    }

    pub async fn reminder(
        &self,
        settings: &Settings,
        user: &User,
        games: &[Game],
        extras: &[Extra],
        teams: &TeamNames,
        brackets: &[Bracket],
    ) -> Result<bool> {
        let mut body = format!("Hello {},\n\nyou have not tipped the following yet:\n", user.username);
        for game in games {
            body.push_str(&format!(
                "\n- {} ({})",
                presentation::game_title(game, teams, brackets),
                game.kickoff.to_chrono().format("%Y-%m-%d %H:%M UTC")
            ));
        }
        for extra in extras {
            body.push_str(&format!(
                "\n- {} (until {})",
                extra.question,
                extra.ending.to_chrono().format("%Y-%m-%d %H:%M UTC")
            ));
        }
        body.push_str(&format!("\n\n{}", self.config.app_url));

        self.send_to(settings, &user.email, "Reminder", body).await
    }

    pub async fn confirm(
        &self,
        settings: &Settings,
        user: &User,
        token: &str,
        confirm_type: ConfirmationType,
    ) -> Result<bool> {
        let (subject, message) = match confirm_type {
            ConfirmationType::Activation => (
                "Activate your account",
                "Please activate your account by opening the following link.",
            ),
            ConfirmationType::ChangeUsername => (
                "Confirm your new e-mail address",
                "Please confirm the change of your e-mail address by opening the following link.",
            ),
            ConfirmationType::ChangeUserpass => (
                "Confirm your new password",
                "Please confirm the change of your password by opening the following link.",
            ),
            ConfirmationType::NewUserpass => (
                "Your new password",
                "A new password was requested for your account. Please confirm it by opening the following link.",
            ),
        };

        let body = format!(
            "Hello {},\n\n{}\n\n{}",
            user.username,
            message,
            self.config.confirm_url(token)
        );
        self.send_to(settings, &user.email, subject, body).await
    }

    pub async fn new_user(&self, settings: &Settings, user: &User, admin: &User) -> Result<bool> {
        let body = format!(
            "A new tipper registered for {}:\n\nUsername: {}\nE-mail: {}",
            settings.game_name, user.username, user.email
        );
        self.send_to(settings, &admin.email, "New tipper", body).await
    }

    pub async fn webservice_error(&self, settings: &Settings, admin: &User, response: &str) -> Result<bool> {
        if response.trim().is_empty() {
            return Ok(false);
        }
        let body = format!("Updating results from the webservice failed:\n\n{}", response);
        self.send_to(settings, &admin.email, "Webservice update failed", body).await
    }

    pub async fn notification(&self, settings: &Settings, user: &User, subject: &str, message: &str) -> Result<bool> {
        if message.trim().is_empty() {
            return Ok(false);
        }
        self.send_to(settings, &user.email, subject, message.to_string()).await
    }

    /// Result of `game` together with the user's own tip and points.
    pub async fn result_notification(
        &self,
        settings: &Settings,
        user: &User,
        title: &str,
        game: &Game,
        tip: Option<(String, i32)>,
    ) -> Result<bool> {
        let tip_text = match tip {
            Some((tip, points)) => format!("Your tip: {}\nYour points: {}", tip, points),
            None => "You did not tip this game.".to_string(),
        };
        let body = format!(
            "{}\nResult: {}\n\n{}\n\nYour place: {}",
            title,
            presentation::result_text(game),
            tip_text,
            user.place
        );
        self.notification(settings, user, &format!("Result {}", title), &body).await
    }

    pub async fn game_tips(&self, settings: &Settings, user: &User, lines: &[TipLine]) -> Result<bool> {
        if lines.is_empty() {
            return Ok(false);
        }

        let mut body = String::from("All tips on the games closed for tipping:\n");
        let mut last_game = "";
        for line in lines {
            if line.game != last_game {
                body.push_str(&format!("\n{}\n", line.game));
                last_game = line.game.as_str();
            }
            body.push_str(&format!("  {}: {}\n", line.username, line.tip));
        }
        self.send_to(settings, &user.email, "Game tips", body).await
    }

    /// One mail with every valid recipient in BCC.
    pub async fn rudelmail(&self, settings: &Settings, subject: &str, message: &str, recipients: &[String]) -> Result<usize> {
        let bcc: Vec<String> = recipients
            .iter()
            .filter(|recipient| {
                let valid = is_valid_email(recipient);
                if !valid {
                    tracing::warn!("Skipping invalid rudelmail recipient '{}'", recipient);
                }
                valid
            })
            .cloned()
            .collect();

        if bcc.is_empty() {
            return Ok(0);
        }

        let mail = Mail {
            from: self.from.clone(),
            reply_to: self.reply_to.clone(),
            to: vec![self.from.clone()],
            bcc,
            subject: Self::subject(settings, subject),
            body: message.to_string(),
        };
        self.mailer.send(&mail).await?;
        Ok(mail.bcc.len())
    }
}

/// Teams keyed by id for mail bodies.
pub fn team_names<'a>(teams: impl IntoIterator<Item = &'a Team>) -> TeamNames {
    teams
        .into_iter()
        .filter_map(|team| Some((team.id?, team.name.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::test_game;
    use crate::services::mailer::MemoryMailer;

    fn service() -> (MailService, Arc<MemoryMailer>) {
        let mailer = Arc::new(MemoryMailer::default());
        let service = MailService::new(mailer.clone(), Arc::new(AppConfig::for_tests()));
        (service, mailer)
    }

    fn user(email: &str) -> User {
        User::new_tipper("anna", email, String::new(), String::new())
    }

    #[tokio::test]
    async fn confirm_mail_links_token() {
        let (service, mailer) = service();
        let settings = Settings::default();

        let sent = service
            .confirm(&settings, &user("anna@example.com"), "abc-123", ConfirmationType::Activation)
            .await
            .unwrap();
        assert!(sent);

        let mails = mailer.sent();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].subject, "[Rudeltippen] Activate your account");
        assert_eq!(mails[0].to, vec!["anna@example.com".to_string()]);
        assert_eq!(mails[0].reply_to, "reply@rudeltippen.de");
        assert!(mails[0].body.contains("http://localhost:9000/confirm/abc-123"));
    }

    #[tokio::test]
    async fn invalid_recipient_is_skipped() {
        let (service, mailer) = service();
        let sent = service
            .notification(&Settings::default(), &user("not-an-address"), "Hello", "Body")
            .await
            .unwrap();
        assert!(!sent);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn reminder_lists_missing_tips() {
        let (service, mailer) = service();
        let spain = Team::new("Spain", "es", Some(1));
        let italy = Team::new("Italy", "it", Some(1));
        let teams = team_names([&spain, &italy]);
        let game = test_game(1, spain.id, italy.id);

        service
            .reminder(&Settings::default(), &user("anna@example.com"), &[game], &[], &teams, &[])
            .await
            .unwrap();

        let mails = mailer.sent();
        assert_eq!(mails[0].subject, "[Rudeltippen] Reminder");
        assert!(mails[0].body.contains("Spain - Italy"));
    }

    #[tokio::test]
    async fn rudelmail_goes_out_as_single_bcc() {
        let (service, mailer) = service();
        let recipients = vec![
            "anna@example.com".to_string(),
            "broken".to_string(),
            "bert@example.com".to_string(),
        ];

        let count = service
            .rudelmail(&Settings::default(), "News", "Final on sunday", &recipients)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let mails = mailer.sent();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].bcc, vec!["anna@example.com".to_string(), "bert@example.com".to_string()]);
        assert_eq!(mails[0].subject, "[Rudeltippen] News");
    }

    #[tokio::test]
    async fn game_tips_group_by_game() {
        let (service, mailer) = service();
        let lines = vec![
            TipLine { game: "Spain - Italy".to_string(), username: "anna".to_string(), tip: "2 : 1".to_string() },
            TipLine { game: "Spain - Italy".to_string(), username: "bert".to_string(), tip: "0 : 0".to_string() },
        ];

        assert!(service.game_tips(&Settings::default(), &user("anna@example.com"), &lines).await.unwrap());
        assert!(!service.game_tips(&Settings::default(), &user("anna@example.com"), &[]).await.unwrap());

        let body = &mailer.sent()[0].body;
        assert_eq!(body.matches("Spain - Italy").count(), 1);
        assert!(body.contains("bert: 0 : 0"));
    }
}
