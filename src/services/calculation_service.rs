use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Collection, Database};

use crate::errors::{AppError, Result};
use crate::models::game::{Game, SetResultRequest};
use crate::services::calculation::{changed_fields, Calculated, Tournament};
use crate::services::data_service::{self, find_all};
use crate::services::presentation;
use crate::services::scoring::Score;
use crate::services::validation::is_valid_score;
use crate::state::AppState;

pub async fn load_tournament(db: &Database) -> Result<Tournament> {
    Ok(Tournament {
        settings: data_service::get_settings(db).await?,
        users: find_all(&data_service::users(db), doc! {}, doc! { "username": 1 }).await?,
        teams: data_service::all_teams(db).await?,
        games: data_service::all_games(db).await?,
        playdays: data_service::all_playdays(db).await?,
        extras: data_service::all_extras(db).await?,
        game_tips: find_all(&data_service::game_tips(db), doc! {}, doc! {}).await?,
        extra_tips: find_all(&data_service::extra_tips(db), doc! {}, doc! {}).await?,
    })
}

/// Sets the calculated fields of every document whose values changed.
async fn write_calculated<T: Calculated + Send + Sync>(
    collection: &Collection<T>,
    before: &[T],
    after: &[T],
) -> Result<usize> {
    let updates = changed_fields(before, after);
    let written = updates.len();
    for (id, fields) in updates {
        collection
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await?;
    }
    Ok(written)
}

/// Recomputes points, tables, playoff slots, extras and standings.
pub async fn calculate(state: &AppState) -> Result<()> {
    let _guard = state.calculation_lock.lock().await;
    let db = &state.db;

    let before = load_tournament(db).await?;
    let mut after = before.clone();
    after.recalculate();

    let mut written = 0;
    written += write_calculated(&data_service::teams(db), &before.teams, &after.teams).await?;
    written += write_calculated(&data_service::games(db), &before.games, &after.games).await?;
    written += write_calculated(&data_service::extras(db), &before.extras, &after.extras).await?;
    written += write_calculated(&data_service::game_tips(db), &before.game_tips, &after.game_tips).await?;
    written += write_calculated(&data_service::extra_tips(db), &before.extra_tips, &after.extra_tips).await?;
    written += write_calculated(&data_service::users(db), &before.users, &after.users).await?;
    written += write_calculated(&data_service::playdays(db), &before.playdays, &after.playdays).await?;

    tracing::info!("Calculation finished, {} documents updated", written);
    Ok(())
}

/// Checks a result before it is stored on `game`.
pub fn validate_result(game: &Game, result: &SetResultRequest) -> Result<()> {
    if !is_valid_score(result.home_score) || !is_valid_score(result.away_score) {
        return Err(AppError::invalid_data("Scores must be between 0 and 99"));
    }
    if game.playoff && !game.has_teams() {
        return Err(AppError::invalid_data("Teams of this game are not decided yet"));
    }

    let regular = Score::new(result.home_score, result.away_score);
    let overtime = match (result.home_score_ot, result.away_score_ot, result.overtime_type) {
        (Some(home), Some(away), Some(_)) => Some(Score::new(home, away)),
        (None, None, None) => None,
        _ => return Err(AppError::invalid_data("Overtime needs both scores and a type")),
    };

    if let Some(ot) = overtime {
        if !game.playoff {
            return Err(AppError::invalid_data("Only playoff games go into overtime"));
        }
        if !is_valid_score(ot.home) || !is_valid_score(ot.away) {
            return Err(AppError::invalid_data("Scores must be between 0 and 99"));
        }
        if ot.difference() == 0 {
            return Err(AppError::invalid_data("Overtime must produce a winner"));
        }
    } else if game.playoff && regular.difference() == 0 {
        return Err(AppError::invalid_data("A level playoff game needs an overtime result"));
    }

    Ok(())
}

pub fn apply_result(game: &mut Game, result: &SetResultRequest) {
    game.home_score = Some(result.home_score);
    game.away_score = Some(result.away_score);
    game.home_score_ot = result.home_score_ot;
    game.away_score_ot = result.away_score_ot;
    game.overtime_type = result.overtime_type;
    game.ended = true;
}

/// Stores the result, recalculates and notifies tippers.
pub async fn set_game_result(state: &AppState, game_id: ObjectId, result: SetResultRequest) -> Result<Game> {
    let mut game = data_service::find_game(&state.db, game_id).await?;
    validate_result(&game, &result)?;
    apply_result(&mut game, &result);

    data_service::games(&state.db)
        .replace_one(doc! { "_id": game_id }, &game)
        .await?;
    tracing::info!("Result {} set for game {}", presentation::result_text(&game), game.number);

    calculate(state).await?;
    let game = data_service::find_game(&state.db, game_id).await?;

    if let Err(e) = notify_result(state, &game).await {
        tracing::error!("Failed to send result notifications for game {}: {}", game.number, e);
    }
    Ok(game)
}

async fn notify_result(state: &AppState, game: &Game) -> Result<()> {
    let db = &state.db;
    let settings = data_service::get_settings(db).await?;
    let teams = data_service::team_names(db).await?;
    let brackets = data_service::all_brackets(db).await?;
    let title = presentation::game_title(game, &teams, &brackets);
    let Some(game_id) = game.id else {
        return Ok(());
    };

    let recipients = find_all(
        &data_service::users(db),
        doc! { "active": true, "notification": true },
        doc! { "username": 1 },
    )
    .await?;

    for user in recipients {
        let Some(user_id) = user.id else {
            continue;
        };
        let tip = data_service::game_tips(db)
            .find_one(doc! { "user_id": user_id, "game_id": game_id })
            .await?
            .map(|tip| (tip.score().to_string(), tip.points.unwrap_or(0)));

        if let Err(e) = state.mail.result_notification(&settings, &user, &title, game, tip).await {
            tracing::warn!("Result notification to {} failed: {}", user.username, e);
        }
    }
    Ok(())
}

pub async fn set_extra_answer(state: &AppState, extra_id: ObjectId, answer: ObjectId) -> Result<()> {
    let extra = data_service::find_extra(&state.db, extra_id).await?;
    if !extra.answers.contains(&answer) {
        return Err(AppError::invalid_data("Answer is not one of the choices"));
    }

    data_service::extras(&state.db)
        .update_one(doc! { "_id": extra_id }, doc! { "$set": { "answer": answer } })
        .await?;
    tracing::info!("Answer set for extra '{}'", extra.question_short);

    calculate(state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::{test_game, OvertimeType};

    fn request(home: i32, away: i32) -> SetResultRequest {
        SetResultRequest {
            home_score: home,
            away_score: away,
            home_score_ot: None,
            away_score_ot: None,
            overtime_type: None,
        }
    }

    fn playoff() -> Game {
        let mut game = test_game(49, Some(ObjectId::new()), Some(ObjectId::new()));
        game.playoff = true;
        game
    }

    #[test]
    fn group_games_accept_draws() {
        let game = test_game(1, Some(ObjectId::new()), Some(ObjectId::new()));
        assert!(validate_result(&game, &request(1, 1)).is_ok());
        assert!(validate_result(&game, &request(100, 1)).is_err());
    }

    #[test]
    fn level_playoff_requires_decisive_overtime() {
        let game = playoff();
        assert!(validate_result(&game, &request(2, 1)).is_ok());
        assert!(validate_result(&game, &request(1, 1)).is_err());

        let mut level_again = request(1, 1);
        level_again.home_score_ot = Some(2);
        level_again.away_score_ot = Some(2);
        level_again.overtime_type = Some(OvertimeType::Overtime);
        assert!(validate_result(&game, &level_again).is_err());

        let mut penalties = request(1, 1);
        penalties.home_score_ot = Some(5);
        penalties.away_score_ot = Some(4);
        penalties.overtime_type = Some(OvertimeType::Penalty);
        assert!(validate_result(&game, &penalties).is_ok());

        let mut game = game;
        apply_result(&mut game, &penalties);
        assert!(game.ended);
        assert_eq!(game.winner(), game.home_team);
    }

    #[test]
    fn partial_overtime_is_rejected() {
        let mut result = request(0, 0);
        result.home_score_ot = Some(1);
        assert!(validate_result(&playoff(), &result).is_err());
    }
}
