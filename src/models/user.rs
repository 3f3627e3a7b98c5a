use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "users";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub registered: BsonDateTime,

    pub active: bool,
    pub admin: bool,

    // Notification preferences
    pub reminder: bool,
    pub notification: bool,
    pub send_standings: bool,
    pub send_game_tips: bool,

    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub tip_points: i32,
    #[serde(default)]
    pub extra_points: i32,
    #[serde(default)]
    pub place: i32,
    #[serde(default)]
    pub previous_place: i32,
    #[serde(default)]
    pub correct_results: i32,
    #[serde(default)]
    pub correct_differences: i32,
    #[serde(default)]
    pub correct_trends: i32,
    #[serde(default)]
    pub correct_extra_tips: i32,
}

impl User {
    /// A freshly registered, not yet activated tipper with all
    /// notifications switched on.
    pub fn new_tipper(username: &str, email: &str, password_hash: String, avatar: String) -> Self {
        User {
            id: Some(ObjectId::new()),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            avatar,
            registered: BsonDateTime::now(),
            active: false,
            admin: false,
            reminder: true,
            notification: true,
            send_standings: true,
            send_game_tips: true,
            points: 0,
            tip_points: 0,
            extra_points: 0,
            place: 0,
            previous_place: 0,
            correct_results: 0,
            correct_differences: 0,
            correct_trends: 0,
            correct_extra_tips: 0,
        }
    }

    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub registered: String,
    pub admin: bool,
    pub points: i32,
    pub tip_points: i32,
    pub extra_points: i32,
    pub place: i32,
    pub previous_place: i32,
    pub place_trend: String,
    pub correct_results: i32,
    pub correct_differences: i32,
    pub correct_trends: i32,
    pub correct_extra_tips: i32,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id_hex(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            registered: user.registered.to_chrono().to_rfc3339(),
            admin: user.admin,
            points: user.points,
            tip_points: user.tip_points,
            extra_points: user.extra_points,
            place: user.place,
            previous_place: user.previous_place,
            place_trend: crate::services::standings::PlaceTrend::of(user).as_str().to_string(),
            correct_results: user.correct_results,
            correct_differences: user.correct_differences,
            correct_trends: user.correct_trends,
            correct_extra_tips: user.correct_extra_tips,
        }
    }
}

/// The signed-in user's own view, including private fields.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub email: String,
    pub active: bool,
    pub reminder: bool,
    pub notification: bool,
    pub send_standings: bool,
    pub send_game_tips: bool,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        ProfileResponse {
            user: UserResponse::from(user),
            email: user.email.clone(),
            active: user.active,
            reminder: user.reminder,
            notification: user.notification,
            send_standings: user.send_standings,
            send_game_tips: user.send_game_tips,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: ProfileResponse,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub admin: bool,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> crate::errors::Result<ObjectId> {
        Ok(ObjectId::parse_str(&self.sub)?)
    }
}
