use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::team::Team;

pub const COLLECTION: &str = "brackets";

/// A group of teams playing each other before the playoffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub number: i32,
    pub name: String,
    pub updatable: bool,
}

#[derive(Debug, Serialize)]
pub struct BracketResponse {
    pub number: i32,
    pub name: String,
    pub teams: Vec<Team>,
}
