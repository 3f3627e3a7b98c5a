use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::{AppError, Result};
use crate::services::scoring::Score;

/// `resultTypeID` of the final regular-time result.
const FINAL_RESULT: i32 = 2;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(rename = "resultTypeID")]
    pub result_type_id: i32,
    pub points_team1: i32,
    pub points_team2: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchData {
    #[serde(rename = "matchID")]
    pub match_id: i64,
    #[serde(rename = "matchDateTimeUTC")]
    pub match_date_time_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub match_is_finished: bool,
    #[serde(default)]
    pub match_results: Vec<MatchResult>,
}

impl MatchData {
    pub fn final_score(&self) -> Option<Score> {
        if !self.match_is_finished {
            return None;
        }
        self.match_results
            .iter()
            .find(|r| r.result_type_id == FINAL_RESULT)
            .map(|r| Score::new(r.points_team1, r.points_team2))
    }
}

#[derive(Clone)]
pub struct OpenLigaService {
    base_url: String,
    client: Client,
}

impl OpenLigaService {
    pub fn new(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub async fn match_data(&self, match_id: &str) -> Result<MatchData> {
        let url = format!("{}/getmatchdata/{}", self.base_url, match_id);
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::external_api(format!(
                "OpenLigaDB returned {} for match {}",
                response.status(),
                match_id
            )));
        }

        Ok(response.json::<MatchData>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FINISHED: &str = r#"{
        "matchID": 66721,
        "matchDateTimeUTC": "2024-06-14T19:00:00Z",
        "matchIsFinished": true,
        "matchResults": [
            {"resultID": 1, "resultName": "Halbzeit", "pointsTeam1": 3, "pointsTeam2": 0, "resultTypeID": 1},
            {"resultID": 2, "resultName": "Endergebnis", "pointsTeam1": 5, "pointsTeam2": 1, "resultTypeID": 2}
        ]
    }"#;

    #[test]
    fn reads_final_result() {
        let data: MatchData = serde_json::from_str(FINISHED).unwrap();
        assert_eq!(data.match_id, 66721);
        assert_eq!(data.final_score(), Some(Score::new(5, 1)));
        assert_eq!(
            data.match_date_time_utc.map(|d| d.to_rfc3339()),
            Some("2024-06-14T19:00:00+00:00".to_string())
        );
    }

    #[test]
    fn unfinished_match_has_no_score() {
        let data: MatchData = serde_json::from_str(
            r#"{"matchID": 1, "matchDateTimeUTC": "2024-06-20T16:00:00Z", "matchIsFinished": false, "matchResults": []}"#,
        )
        .unwrap();
        assert_eq!(data.final_score(), None);
    }
}
