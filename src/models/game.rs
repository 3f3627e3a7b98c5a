use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::services::scoring::{Score, Trend};

pub const COLLECTION: &str = "games";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OvertimeType {
    Overtime,
    Penalty,
}

impl OvertimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OvertimeType::Overtime => "overtime",
            OvertimeType::Penalty => "penalty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub number: i32,
    pub playday: i32,
    pub bracket: Option<i32>,

    pub home_team: Option<ObjectId>,
    pub away_team: Option<ObjectId>,
    pub home_reference: Option<String>,
    pub away_reference: Option<String>,

    pub kickoff: BsonDateTime,

    // Regular time result
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,

    // Result after overtime or penalty shootout
    pub home_score_ot: Option<i32>,
    pub away_score_ot: Option<i32>,
    pub overtime_type: Option<OvertimeType>,

    pub ended: bool,
    pub playoff: bool,
    pub updatable: bool,

    #[serde(default)]
    pub reminder: bool,
    #[serde(default)]
    pub informed: bool,
    pub webservice_id: Option<String>,
}

impl Game {
    pub fn regular_result(&self) -> Option<Score> {
        if !self.ended {
            return None;
        }
        match (self.home_score, self.away_score) {
            (Some(home), Some(away)) => Some(Score::new(home, away)),
            _ => None,
        }
    }

    pub fn overtime_result(&self) -> Option<Score> {
        match (self.home_score_ot, self.away_score_ot, self.overtime_type) {
            (Some(home), Some(away), Some(_)) => Some(Score::new(home, away)),
            _ => None,
        }
    }

    /// The result that decides who advances: overtime if played, else regular time.
    pub fn final_result(&self) -> Option<Score> {
        let regular = self.regular_result()?;
        Some(self.overtime_result().unwrap_or(regular))
    }

    pub fn winner(&self) -> Option<ObjectId> {
        match self.final_result()?.trend() {
            Trend::Home => self.home_team,
            Trend::Away => self.away_team,
            Trend::Draw => None,
        }
    }

    pub fn loser(&self) -> Option<ObjectId> {
        match self.final_result()?.trend() {
            Trend::Home => self.away_team,
            Trend::Away => self.home_team,
            Trend::Draw => None,
        }
    }

    pub fn has_teams(&self) -> bool {
        self.home_team.is_some() && self.away_team.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct SetResultRequest {
    pub home_score: i32,
    pub away_score: i32,
    pub home_score_ot: Option<i32>,
    pub away_score_ot: Option<i32>,
    pub overtime_type: Option<OvertimeType>,
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    #[serde(flatten)]
    pub game: Game,
    pub home_name: String,
    pub away_name: String,
    pub result: String,
    pub kickoff_in: String,
    pub trend: String,
}

#[cfg(test)]
pub(crate) fn test_game(number: i32, home: Option<ObjectId>, away: Option<ObjectId>) -> Game {
    Game {
        id: Some(ObjectId::new()),
        number,
        playday: 1,
        bracket: Some(1),
        home_team: home,
        away_team: away,
        home_reference: None,
        away_reference: None,
        kickoff: BsonDateTime::now(),
        home_score: None,
        away_score: None,
        home_score_ot: None,
        away_score_ot: None,
        overtime_type: None,
        ended: false,
        playoff: false,
        updatable: false,
        reminder: false,
        informed: false,
        webservice_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_uses_overtime_result() {
        let home = ObjectId::new();
        let away = ObjectId::new();
        let mut game = test_game(49, Some(home), Some(away));
        game.playoff = true;
        game.ended = true;
        game.home_score = Some(1);
        game.away_score = Some(1);
        assert_eq!(game.winner(), None);

        game.home_score_ot = Some(4);
        game.away_score_ot = Some(5);
        game.overtime_type = Some(OvertimeType::Penalty);
        assert_eq!(game.winner(), Some(away));
        assert_eq!(game.loser(), Some(home));
        assert_eq!(game.regular_result(), Some(Score::new(1, 1)));
    }

    #[test]
    fn unfinished_game_has_no_result() {
        let mut game = test_game(1, Some(ObjectId::new()), Some(ObjectId::new()));
        game.home_score = Some(2);
        game.away_score = Some(0);
        assert_eq!(game.regular_result(), None);
        assert_eq!(game.winner(), None);
    }
}
