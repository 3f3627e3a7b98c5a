use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::settings::Settings;

/// Partial settings update; absent fields keep their value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 100, message = "Game name must be 1-100 characters"))]
    pub game_name: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub points_tip: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub points_tip_diff: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub points_tip_trend: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub points_game_win: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub points_game_draw: Option<i32>,
    #[validate(range(min = 0, max = 1440))]
    pub minutes_before_tip: Option<i64>,
    pub inform_on_new_tipper: Option<bool>,
    pub enable_registration: Option<bool>,
}

impl UpdateSettingsRequest {
    pub fn apply(self, settings: &mut Settings) {
        if let Some(game_name) = self.game_name {
            settings.game_name = game_name;
        }
        if let Some(points) = self.points_tip {
            settings.points_tip = points;
        }
        if let Some(points) = self.points_tip_diff {
            settings.points_tip_diff = points;
        }
        if let Some(points) = self.points_tip_trend {
            settings.points_tip_trend = points;
        }
        if let Some(points) = self.points_game_win {
            settings.points_game_win = points;
        }
        if let Some(points) = self.points_game_draw {
            settings.points_game_draw = points;
        }
        if let Some(minutes) = self.minutes_before_tip {
            settings.minutes_before_tip = minutes;
        }
        if let Some(inform) = self.inform_on_new_tipper {
            settings.inform_on_new_tipper = inform;
        }
        if let Some(enable) = self.enable_registration {
            settings.enable_registration = enable;
        }
    }

    /// Whether the change affects already calculated points.
    pub fn changes_scoring(&self) -> bool {
        self.points_tip.is_some()
            || self.points_tip_diff.is_some()
            || self.points_tip_trend.is_some()
            || self.points_game_win.is_some()
            || self.points_game_draw.is_some()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RudelmailRequest {
    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RudelmailResponse {
    pub success: bool,
    pub recipients: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_only_given_fields() {
        let mut settings = Settings::default();
        let update = UpdateSettingsRequest {
            points_tip: Some(5),
            enable_registration: Some(false),
            ..Default::default()
        };
        assert!(update.changes_scoring());
        update.apply(&mut settings);

        assert_eq!(settings.points_tip, 5);
        assert_eq!(settings.points_tip_diff, 2);
        assert!(!settings.enable_registration);
        assert_eq!(settings.game_name, "Rudeltippen");
    }

    #[test]
    fn rejects_out_of_range_values() {
        let update = UpdateSettingsRequest {
            minutes_before_tip: Some(-1),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
