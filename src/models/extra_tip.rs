use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "extratips";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraTip {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub extra_id: ObjectId,
    pub answer: ObjectId,
    pub points: Option<i32>,
    pub placed: BsonDateTime,
}
