use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::services::scoring::Score;

pub const COLLECTION: &str = "gametips";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTip {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub game_id: ObjectId,
    pub playday: i32,
    pub home_score: i32,
    pub away_score: i32,
    /// Unset until the game has a result.
    pub points: Option<i32>,
    pub placed: BsonDateTime,
}

impl GameTip {
    pub fn score(&self) -> Score {
        Score::new(self.home_score, self.away_score)
    }
}

#[derive(Debug, Deserialize)]
pub struct GameTipEntry {
    pub game: String,
    pub home_score: i32,
    pub away_score: i32,
}

#[derive(Debug, Deserialize)]
pub struct SubmitGameTipsRequest {
    pub tips: Vec<GameTipEntry>,
}

#[derive(Debug, Serialize)]
pub struct RejectedTip {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitTipsResponse {
    pub success: bool,
    pub placed: usize,
    pub rejected: Vec<RejectedTip>,
}

#[derive(Debug, Serialize)]
pub struct GameTipView {
    pub username: String,
    pub tip: String,
    pub points: Option<i32>,
}
