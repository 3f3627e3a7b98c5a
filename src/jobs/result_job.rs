use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

use crate::errors::Result;
use crate::models::game::{Game, SetResultRequest};
use crate::services::calculation_service;
use crate::services::data_service::{self, find_all};
use crate::services::openliga_service::{MatchData, OpenLigaService};
use crate::state::AppState;

const GAME_MINUTES: i64 = 90;

pub fn is_due(game: &Game, now: DateTime<Utc>) -> bool {
    !game.ended && game.webservice_id.is_some() && game.kickoff.to_chrono() + Duration::minutes(GAME_MINUTES) <= now
}

/// The result to store, if the webservice has a final one this game can take.
///
/// Level playoff games need the overtime result entered by an admin.
pub fn result_from(game: &Game, data: &MatchData) -> Option<SetResultRequest> {
    let score = data.final_score()?;
    if game.playoff && score.difference() == 0 {
        return None;
    }
    Some(SetResultRequest {
        home_score: score.home,
        away_score: score.away,
        home_score_ot: None,
        away_score_ot: None,
        overtime_type: None,
    })
}

pub async fn run(state: &AppState) -> Result<()> {
    let db = &state.db;
    let now = Utc::now();
    let started_before = BsonDateTime::from_chrono(now - Duration::minutes(GAME_MINUTES));

    let games = find_all(
        &data_service::games(db),
        doc! { "ended": false, "webservice_id": { "$ne": null }, "kickoff": { "$lte": started_before } },
        doc! { "number": 1 },
    )
    .await?;

    let openliga = OpenLigaService::new(&state.config.openliga_url, state.http.clone());
    let mut results = Vec::new();
    for game in games.iter().filter(|g| is_due(g, now)) {
        let (Some(id), Some(match_id)) = (game.id, game.webservice_id.as_deref()) else {
            continue;
        };

        let data = match openliga.match_data(match_id).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Fetching result of game {} failed: {}", game.number, e);
                inform_admins(state, &format!("Game {} (match {}): {}", game.number, match_id, e)).await;
                continue;
            }
        };

        match result_from(game, &data) {
            Some(result) => results.push((game.number, id, result)),
            None => tracing::info!("No final result for game {} yet", game.number),
        }
    }

    let stored = store_each(results, |id, result| calculation_service::set_game_result(state, id, result)).await;
    tracing::info!("Stored {} results from OpenLigaDB", stored);
    Ok(())
}

/// Stores every result in turn; a failing game is logged and skipped.
async fn store_each<T, F, Fut>(results: Vec<(i32, ObjectId, SetResultRequest)>, mut store: F) -> usize
where
    F: FnMut(ObjectId, SetResultRequest) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut stored = 0;
    for (number, id, result) in results {
        match store(id, result).await {
            Ok(_) => stored += 1,
            Err(e) => tracing::warn!("Storing result of game {} failed: {}", number, e),
        }
    }
    stored
}

async fn inform_admins(state: &AppState, response: &str) {
    let (settings, admins) = match (
        data_service::get_settings(&state.db).await,
        data_service::admins(&state.db).await,
    ) {
        (Ok(settings), Ok(admins)) => (settings, admins),
        _ => return,
    };
    for admin in admins {
        if let Err(e) = state.mail.webservice_error(&settings, &admin, response).await {
            tracing::error!("Error mail to {} failed: {}", admin.username, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::test_game;
    use crate::errors::AppError;
    use crate::services::openliga_service::MatchResult;

    fn finished(home: i32, away: i32) -> MatchData {
        MatchData {
            match_id: 1,
            match_date_time_utc: None,
            match_is_finished: true,
            match_results: vec![MatchResult {
                result_type_id: 2,
                points_team1: home,
                points_team2: away,
            }],
        }
    }

    #[test]
    fn due_ninety_minutes_after_kickoff() {
        let now = Utc::now();
        let mut game = test_game(1, Some(ObjectId::new()), Some(ObjectId::new()));
        game.webservice_id = Some("66721".to_string());
        game.kickoff = BsonDateTime::from_chrono(now - Duration::minutes(80));
        assert!(!is_due(&game, now));

        game.kickoff = BsonDateTime::from_chrono(now - Duration::minutes(95));
        assert!(is_due(&game, now));

        game.webservice_id = None;
        assert!(!is_due(&game, now));
    }

    #[test]
    fn level_playoff_waits_for_admin() {
        let mut game = test_game(49, Some(ObjectId::new()), Some(ObjectId::new()));
        assert_eq!(result_from(&game, &finished(1, 1)).map(|r| r.home_score), Some(1));

        game.playoff = true;
        assert!(result_from(&game, &finished(1, 1)).is_none());
        assert_eq!(result_from(&game, &finished(2, 1)).map(|r| r.away_score), Some(1));
    }

    #[tokio::test]
    async fn failing_result_does_not_stop_the_others() {
        let results: Vec<_> = (1..=3)
            .map(|number| (number, ObjectId::new(), result_from(&test_game(number, None, None), &finished(number, 0)).unwrap()))
            .collect();
        let failing = results[1].1;

        let mut attempted = Vec::new();
        let stored = store_each(results, |id, result| {
            attempted.push(result.home_score);
            async move {
                if id == failing {
                    Err(AppError::invalid_data("Scores must be between 0 and 99"))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(stored, 2);
        assert_eq!(attempted, vec![1, 2, 3]);
    }
}
