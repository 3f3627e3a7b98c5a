use std::collections::HashSet;

use chrono::{Duration, Utc};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

use crate::errors::Result;
use crate::models::{extra::Extra, game::Game};
use crate::services::data_service::{self, find_all};
use crate::state::AppState;

const WINDOW_HOURS: i64 = 24;

/// Games and extras among `games`/`extras` the user has not tipped yet.
pub fn untipped(
    games: &[Game],
    extras: &[Extra],
    tipped_games: &HashSet<ObjectId>,
    tipped_extras: &HashSet<ObjectId>,
) -> (Vec<Game>, Vec<Extra>) {
    let games = games
        .iter()
        .filter(|g| g.id.is_some_and(|id| !tipped_games.contains(&id)))
        .cloned()
        .collect();
    let extras = extras
        .iter()
        .filter(|e| e.id.is_some_and(|id| !tipped_extras.contains(&id)))
        .cloned()
        .collect();
    (games, extras)
}

pub async fn run(state: &AppState) -> Result<()> {
    let db = &state.db;
    let settings = data_service::get_settings(db).await?;
    let now = Utc::now();
    let from = BsonDateTime::from_chrono(now);
    let until = BsonDateTime::from_chrono(now + Duration::hours(WINDOW_HOURS));

    let games = find_all(
        &data_service::games(db),
        doc! { "ended": false, "reminder": false, "kickoff": { "$gt": from, "$lte": until } },
        doc! { "kickoff": 1 },
    )
    .await?;
    let extras = find_all(
        &data_service::extras(db),
        doc! { "reminder": false, "ending": { "$gt": from, "$lte": until } },
        doc! { "ending": 1 },
    )
    .await?;

    if games.is_empty() && extras.is_empty() {
        return Ok(());
    }

    let teams = data_service::team_names(db).await?;
    let brackets = data_service::all_brackets(db).await?;
    let game_ids: Vec<ObjectId> = games.iter().filter_map(|g| g.id).collect();
    let extra_ids: Vec<ObjectId> = extras.iter().filter_map(|e| e.id).collect();

    let users = find_all(
        &data_service::users(db),
        doc! { "active": true, "reminder": true },
        doc! { "username": 1 },
    )
    .await?;

    for user in users {
        let Some(user_id) = user.id else {
            continue;
        };
        let tipped_games: HashSet<ObjectId> = find_all(
            &data_service::game_tips(db),
            doc! { "user_id": user_id, "game_id": { "$in": game_ids.clone() } },
            doc! {},
        )
        .await?
        .into_iter()
        .map(|t| t.game_id)
        .collect();
        let tipped_extras: HashSet<ObjectId> = find_all(
            &data_service::extra_tips(db),
            doc! { "user_id": user_id, "extra_id": { "$in": extra_ids.clone() } },
            doc! {},
        )
        .await?
        .into_iter()
        .map(|t| t.extra_id)
        .collect();

        let (missing_games, missing_extras) = untipped(&games, &extras, &tipped_games, &tipped_extras);
        if missing_games.is_empty() && missing_extras.is_empty() {
            continue;
        }

        match state
            .mail
            .reminder(&settings, &user, &missing_games, &missing_extras, &teams, &brackets)
            .await
        {
            Ok(true) => tracing::info!("Reminder sent to {}", user.username),
            Ok(false) => {}
            Err(e) => tracing::error!("Reminder to {} failed: {}", user.username, e),
        }
    }

    data_service::games(db)
        .update_many(doc! { "_id": { "$in": game_ids.clone() } }, doc! { "$set": { "reminder": true } })
        .await?;
    data_service::extras(db)
        .update_many(doc! { "_id": { "$in": extra_ids.clone() } }, doc! { "$set": { "reminder": true } })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::test_game;

    #[test]
    fn keeps_only_untipped_entries() {
        let games = vec![test_game(1, None, None), test_game(2, None, None), test_game(3, None, None)];
        let tipped: HashSet<ObjectId> = [games[0].id, games[2].id].into_iter().flatten().collect();

        let (missing, extras) = untipped(&games, &[], &tipped, &HashSet::new());
        assert_eq!(missing.iter().map(|g| g.number).collect::<Vec<_>>(), vec![2]);
        assert!(extras.is_empty());

        let all: HashSet<ObjectId> = games.iter().filter_map(|g| g.id).collect();
        assert!(untipped(&games, &[], &all, &HashSet::new()).0.is_empty());
    }
}
