use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub game_name: String,
    pub points_tip: i32,
    pub points_tip_diff: i32,
    pub points_tip_trend: i32,
    pub points_game_win: i32,
    pub points_game_draw: i32,
    pub minutes_before_tip: i64,
    pub playoffs: bool,
    pub num_pre_playoff_games: i32,
    pub inform_on_new_tipper: bool,
    pub enable_registration: bool,
    pub initialized_at: BsonDateTime,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            game_name: "Rudeltippen".to_string(),
            points_tip: 4,
            points_tip_diff: 2,
            points_tip_trend: 1,
            points_game_win: 3,
            points_game_draw: 1,
            minutes_before_tip: 5,
            playoffs: false,
            num_pre_playoff_games: 0,
            inform_on_new_tipper: true,
            enable_registration: true,
            initialized_at: BsonDateTime::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub game_name: String,
    pub points_tip: i32,
    pub points_tip_diff: i32,
    pub points_tip_trend: i32,
    pub minutes_before_tip: i64,
    pub playoffs: bool,
    pub num_pre_playoff_games: i32,
}

impl From<&Settings> for RulesResponse {
    fn from(settings: &Settings) -> Self {
        RulesResponse {
            game_name: settings.game_name.clone(),
            points_tip: settings.points_tip,
            points_tip_diff: settings.points_tip_diff,
            points_tip_trend: settings.points_tip_trend,
            minutes_before_tip: settings.minutes_before_tip,
            playoffs: settings.playoffs,
            num_pre_playoff_games: settings.num_pre_playoff_games,
        }
    }
}
