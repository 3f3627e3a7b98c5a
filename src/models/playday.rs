use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::game::GameResponse;

pub const COLLECTION: &str = "playdays";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playday {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub number: i32,
    pub name: String,
    pub current: bool,
    pub playoff: bool,
}

#[derive(Debug, Serialize)]
pub struct PlaydayResponse {
    #[serde(flatten)]
    pub playday: Playday,
    pub games: Vec<GameResponse>,
}
