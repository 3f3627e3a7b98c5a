use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "extras";

/// A bonus question, answered with one of the listed teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extra {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub question: String,
    pub question_short: String,
    pub points: i32,
    pub answers: Vec<ObjectId>,
    pub answer: Option<ObjectId>,
    pub ending: BsonDateTime,
    /// Game or bracket reference that decides the answer automatically.
    pub extra_reference: Option<String>,
    #[serde(default)]
    pub reminder: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExtraTipEntry {
    pub extra: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitExtraTipsRequest {
    pub tips: Vec<ExtraTipEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SetAnswerRequest {
    pub answer: String,
}
