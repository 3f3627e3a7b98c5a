use mongodb::bson::doc;

use crate::errors::Result;
use crate::services::data_service::{self, find_all};
use crate::services::standings;
use crate::state::AppState;

/// Mails the top 3 once the tournament has started.
pub async fn run(state: &AppState) -> Result<()> {
    let db = &state.db;
    let opener = data_service::games(db).find_one(doc! { "number": 1 }).await?;
    if !opener.is_some_and(|game| game.ended) {
        tracing::debug!("First game has not ended, no standings to send");
        return Ok(());
    }

    let settings = data_service::get_settings(db).await?;
    let ranked = data_service::active_users(db).await?;
    let message = standings::top_three_message(&ranked);

    let recipients = find_all(
        &data_service::users(db),
        doc! { "active": true, "send_standings": true },
        doc! { "username": 1 },
    )
    .await?;

    for user in recipients {
        if let Err(e) = state.mail.notification(&settings, &user, "Top 3", &message).await {
            tracing::error!("Standings mail to {} failed: {}", user.username, e);
        }
    }
    Ok(())
}
