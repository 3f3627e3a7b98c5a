//! Rules deciding whether a tip may be placed.

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::oid::ObjectId;

use crate::models::{extra::Extra, game::Game, settings::Settings};
use crate::services::validation::is_valid_score;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipRejection {
    Ended,
    Closed,
    TeamsUnknown,
    InvalidScore,
    InvalidAnswer,
}

impl TipRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            TipRejection::Ended => "game or question has already ended",
            TipRejection::Closed => "tipping is closed",
            TipRejection::TeamsUnknown => "teams are not decided yet",
            TipRejection::InvalidScore => "score must be between 0 and 99",
            TipRejection::InvalidAnswer => "answer is not one of the choices",
        }
    }
}

/// The latest moment a tip on `game` is accepted.
pub fn tipping_deadline(game: &Game, settings: &Settings) -> DateTime<Utc> {
    game.kickoff.to_chrono() - Duration::minutes(settings.minutes_before_tip)
}

pub fn is_tippable(game: &Game, settings: &Settings, now: DateTime<Utc>) -> bool {
    !game.ended && now < tipping_deadline(game, settings) && (!game.playoff || game.has_teams())
}

pub fn check_game_tip(
    game: &Game,
    settings: &Settings,
    home: i32,
    away: i32,
    now: DateTime<Utc>,
) -> Result<(), TipRejection> {
    if game.ended {
        return Err(TipRejection::Ended);
    }
    if now >= tipping_deadline(game, settings) {
        return Err(TipRejection::Closed);
    }
    if game.playoff && !game.has_teams() {
        return Err(TipRejection::TeamsUnknown);
    }
    if !is_valid_score(home) || !is_valid_score(away) {
        return Err(TipRejection::InvalidScore);
    }
    Ok(())
}

pub fn check_extra_tip(extra: &Extra, answer: ObjectId, now: DateTime<Utc>) -> Result<(), TipRejection> {
    if now >= extra.ending.to_chrono() {
        return Err(TipRejection::Ended);
    }
    if !extra.answers.contains(&answer) {
        return Err(TipRejection::InvalidAnswer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::test_game;
    use mongodb::bson::DateTime as BsonDateTime;

    fn game_at(now: DateTime<Utc>, minutes: i64) -> Game {
        let mut game = test_game(1, Some(ObjectId::new()), Some(ObjectId::new()));
        game.kickoff = BsonDateTime::from_chrono(now + Duration::minutes(minutes));
        game
    }

    #[test]
    fn tipping_closes_before_kickoff() {
        let now = Utc::now();
        let settings = Settings::default();

        assert_eq!(check_game_tip(&game_at(now, 60), &settings, 1, 0, now), Ok(()));
        assert_eq!(
            check_game_tip(&game_at(now, 5), &settings, 1, 0, now),
            Err(TipRejection::Closed)
        );
        assert_eq!(
            check_game_tip(&game_at(now, 4), &settings, 1, 0, now),
            Err(TipRejection::Closed)
        );
        assert!(is_tippable(&game_at(now, 6), &settings, now));
    }

    #[test]
    fn rejects_ended_unresolved_and_invalid() {
        let now = Utc::now();
        let settings = Settings::default();

        let mut ended = game_at(now, 60);
        ended.ended = true;
        assert_eq!(check_game_tip(&ended, &settings, 1, 0, now), Err(TipRejection::Ended));

        let mut playoff = game_at(now, 60);
        playoff.playoff = true;
        playoff.away_team = None;
        assert_eq!(
            check_game_tip(&playoff, &settings, 1, 0, now),
            Err(TipRejection::TeamsUnknown)
        );
        assert!(!is_tippable(&playoff, &settings, now));

        assert_eq!(
            check_game_tip(&game_at(now, 60), &settings, 100, 0, now),
            Err(TipRejection::InvalidScore)
        );
    }

    #[test]
    fn extra_answers_must_be_listed() {
        let now = Utc::now();
        let team = ObjectId::new();
        let extra = Extra {
            id: None,
            question: "Who wins the tournament?".to_string(),
            question_short: "Champion".to_string(),
            points: 10,
            answers: vec![team],
            answer: None,
            ending: BsonDateTime::from_chrono(now + Duration::days(1)),
            extra_reference: None,
            reminder: false,
        };

        assert_eq!(check_extra_tip(&extra, team, now), Ok(()));
        assert_eq!(
            check_extra_tip(&extra, ObjectId::new(), now),
            Err(TipRejection::InvalidAnswer)
        );
        assert_eq!(
            check_extra_tip(&extra, team, now + Duration::days(2)),
            Err(TipRejection::Ended)
        );
    }
}
