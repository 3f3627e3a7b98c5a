use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "teams";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub flag: String,
    pub bracket: Option<i32>,

    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub goals_for: i32,
    #[serde(default)]
    pub goals_against: i32,
    #[serde(default)]
    pub goals_diff: i32,
    #[serde(default)]
    pub games_played: i32,
    #[serde(default)]
    pub games_won: i32,
    #[serde(default)]
    pub games_draw: i32,
    #[serde(default)]
    pub games_lost: i32,
    #[serde(default)]
    pub place: i32,
    #[serde(default)]
    pub previous_place: i32,
}

impl Team {
    pub fn new(name: &str, flag: &str, bracket: Option<i32>) -> Self {
        Team {
            id: Some(ObjectId::new()),
            name: name.to_string(),
            flag: flag.to_string(),
            bracket,
            points: 0,
            goals_for: 0,
            goals_against: 0,
            goals_diff: 0,
            games_played: 0,
            games_won: 0,
            games_draw: 0,
            games_lost: 0,
            place: 0,
            previous_place: 0,
        }
    }

    pub fn reset_table(&mut self) {
        self.points = 0;
        self.goals_for = 0;
        self.goals_against = 0;
        self.goals_diff = 0;
        self.games_played = 0;
        self.games_won = 0;
        self.games_draw = 0;
        self.games_lost = 0;
    }
}
