use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{doc, DateTime as BsonDateTime};

use crate::errors::Result;
use crate::models::confirmation::{Confirmation, ConfirmationType};
use crate::services::data_service::{self, find_all};
use crate::state::AppState;

const ACTIVATION_DAYS: i64 = 2;

pub fn activation_expired(confirmation: &Confirmation, now: DateTime<Utc>) -> bool {
    confirmation.confirm_type == ConfirmationType::Activation
        && confirmation.created.to_chrono() + Duration::days(ACTIVATION_DAYS) < now
}

/// Removes users who never activated their account.
pub async fn run(state: &AppState) -> Result<()> {
    let db = &state.db;
    let now = Utc::now();
    let cutoff = BsonDateTime::from_chrono(now - Duration::days(ACTIVATION_DAYS));

    let expired = find_all(
        &data_service::confirmations(db),
        doc! { "confirm_type": "ACTIVATION", "created": { "$lt": cutoff } },
        doc! {},
    )
    .await?;

    for confirmation in expired.iter().filter(|c| activation_expired(c, now)) {
        let user = data_service::users(db)
            .find_one(doc! { "_id": confirmation.user_id })
            .await?;

        if let Some(user) = user.filter(|u| !u.active) {
            tracing::info!(
                "Deleting user '{}' ({}), account was not activated within {} days",
                user.username,
                user.email,
                ACTIVATION_DAYS
            );
            data_service::users(db).delete_one(doc! { "_id": confirmation.user_id }).await?;
        }
        data_service::confirmations(db)
            .delete_many(doc! { "user_id": confirmation.user_id })
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn activation_expires_after_two_days() {
        let now = Utc::now();
        let mut confirmation = Confirmation::new(ObjectId::new(), ConfirmationType::Activation, None);
        confirmation.created = BsonDateTime::from_chrono(now - Duration::days(3));
        assert!(activation_expired(&confirmation, now));

        confirmation.created = BsonDateTime::from_chrono(now - Duration::days(1));
        assert!(!activation_expired(&confirmation, now));

        let mut password = Confirmation::new(ObjectId::new(), ConfirmationType::NewUserpass, None);
        password.created = BsonDateTime::from_chrono(now - Duration::days(3));
        assert!(!activation_expired(&password, now));
    }
}
