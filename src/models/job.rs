use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "jobs";

/// Persisted descriptor of a scheduled job; admins switch jobs on and off here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    pub executed: String,
    pub active: bool,
    pub last_run: Option<BsonDateTime>,
}
