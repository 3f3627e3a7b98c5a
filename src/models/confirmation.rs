use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "confirmations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationType {
    #[serde(rename = "ACTIVATION")]
    Activation,
    #[serde(rename = "CHANGEUSERNAME")]
    ChangeUsername,
    #[serde(rename = "CHANGEUSERPASS")]
    ChangeUserpass,
    #[serde(rename = "NEWUSERPASS")]
    NewUserpass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub token: String,
    pub confirm_type: ConfirmationType,
    /// New e-mail address or new password hash, depending on the type.
    #[serde(default)]
    pub confirm_value: Option<String>,
    pub created: BsonDateTime,
}

impl Confirmation {
    pub fn new(user_id: ObjectId, confirm_type: ConfirmationType, confirm_value: Option<String>) -> Self {
        Confirmation {
            id: None,
            user_id,
            token: uuid::Uuid::new_v4().to_string(),
            confirm_type,
            confirm_value,
            created: BsonDateTime::now(),
        }
    }
}
