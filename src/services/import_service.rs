//! Loads the initial tournament from JSON-lines files.
//!
//! Every line of `brackets.json`, `teams.json`, `playdays.json`,
//! `games.json` and `extras.json` is one object. Records reference each
//! other through string keys that only exist inside these files.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::Database;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::{AppError, Result};
use crate::jobs;
use crate::models::{
    bracket::{self, Bracket},
    extra::{self, Extra},
    game::{self, Game},
    playday::{self, Playday},
    settings::Settings,
    team::{self, Team},
    user::User,
};
use crate::services::{auth_service, calculation_service, data_service};
use crate::state::AppState;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct BracketRecord {
    id: String,
    name: String,
    number: i32,
    #[serde(default)]
    updatable: bool,
}

#[derive(Debug, Deserialize)]
struct TeamRecord {
    id: String,
    name: String,
    flag: String,
    bracket: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaydayRecord {
    id: String,
    name: String,
    number: i32,
    #[serde(default)]
    current: bool,
    #[serde(default)]
    playoff: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameRecord {
    number: i32,
    playday: String,
    bracket: Option<String>,
    home_team: Option<String>,
    away_team: Option<String>,
    home_reference: Option<String>,
    away_reference: Option<String>,
    kickoff: String,
    #[serde(default)]
    playoff: bool,
    #[serde(default)]
    ended: bool,
    #[serde(default)]
    updatable: bool,
    #[serde(rename = "webserviceID")]
    webservice_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtraRecord {
    question: String,
    question_short: String,
    points: i32,
    ending: String,
    extra_reference: Option<String>,
}

#[derive(Debug, Default)]
pub struct InitialData {
    pub brackets: Vec<Bracket>,
    pub teams: Vec<Team>,
    pub playdays: Vec<Playday>,
    pub games: Vec<Game>,
    pub extras: Vec<Extra>,
}

fn parse_lines<T: DeserializeOwned>(content: &str, file: &str) -> Result<Vec<T>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| {
                AppError::invalid_data(format!("{} line {}: {}", file, index + 1, e))
            })
        })
        .collect()
}

pub fn parse_date(value: &str) -> Result<BsonDateTime> {
    let parsed = NaiveDateTime::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| AppError::invalid_data(format!("Invalid date '{}': {}", value, e)))?;
    Ok(BsonDateTime::from_chrono(parsed.and_utc()))
}

fn lookup<T: Copy>(keys: &HashMap<String, T>, key: &str, kind: &str) -> Result<T> {
    keys.get(key)
        .copied()
        .ok_or_else(|| AppError::invalid_data(format!("Unknown {} '{}'", kind, key)))
}

/// Resolves the file-local keys of the five files into documents.
pub fn parse_initial_data(
    brackets: &str,
    teams: &str,
    playdays: &str,
    games: &str,
    extras: &str,
) -> Result<InitialData> {
    let mut data = InitialData::default();

    let mut bracket_numbers: HashMap<String, i32> = HashMap::new();
    for record in parse_lines::<BracketRecord>(brackets, "brackets.json")? {
        bracket_numbers.insert(record.id, record.number);
        data.brackets.push(Bracket {
            id: Some(ObjectId::new()),
            number: record.number,
            name: record.name,
            updatable: record.updatable,
        });
    }

    let mut team_ids: HashMap<String, ObjectId> = HashMap::new();
    for record in parse_lines::<TeamRecord>(teams, "teams.json")? {
        let bracket = match record.bracket.as_deref() {
            Some(key) => Some(lookup(&bracket_numbers, key, "bracket")?),
            None => None,
        };
        let team = Team::new(&record.name, &record.flag, bracket);
        if let Some(id) = team.id {
            team_ids.insert(record.id, id);
        }
        data.teams.push(team);
    }

    let mut playday_numbers: HashMap<String, i32> = HashMap::new();
    for record in parse_lines::<PlaydayRecord>(playdays, "playdays.json")? {
        playday_numbers.insert(record.id, record.number);
        data.playdays.push(Playday {
            id: Some(ObjectId::new()),
            number: record.number,
            name: record.name,
            current: record.current,
            playoff: record.playoff,
        });
    }

    for record in parse_lines::<GameRecord>(games, "games.json")? {
        let team = |key: Option<&str>| -> Result<Option<ObjectId>> {
            key.map(|key| lookup(&team_ids, key, "team")).transpose()
        };
        data.games.push(Game {
            id: Some(ObjectId::new()),
            number: record.number,
            playday: lookup(&playday_numbers, &record.playday, "playday")?,
            bracket: record
                .bracket
                .as_deref()
                .map(|key| lookup(&bracket_numbers, key, "bracket"))
                .transpose()?,
            home_team: team(record.home_team.as_deref())?,
            away_team: team(record.away_team.as_deref())?,
            home_reference: record.home_reference,
            away_reference: record.away_reference,
            kickoff: parse_date(&record.kickoff)?,
            home_score: None,
            away_score: None,
            home_score_ot: None,
            away_score_ot: None,
            overtime_type: None,
            ended: record.ended,
            playoff: record.playoff,
            updatable: record.updatable,
            reminder: false,
            informed: false,
            webservice_id: record.webservice_id.filter(|id| !id.trim().is_empty()),
        });
    }

    let answers: Vec<ObjectId> = data.teams.iter().filter_map(|t| t.id).collect();
    for record in parse_lines::<ExtraRecord>(extras, "extras.json")? {
        data.extras.push(Extra {
            id: Some(ObjectId::new()),
            question: record.question,
            question_short: record.question_short,
            points: record.points,
            answers: answers.clone(),
            answer: None,
            ending: parse_date(&record.ending)?,
            extra_reference: record.extra_reference.filter(|r| !r.trim().is_empty()),
            reminder: false,
        });
    }

    Ok(data)
}

pub async fn read_initial_data(dir: &Path) -> Result<InitialData> {
    let read = |name: &str| tokio::fs::read_to_string(dir.join(name));
    parse_initial_data(
        &read("brackets.json").await?,
        &read("teams.json").await?,
        &read("playdays.json").await?,
        &read("games.json").await?,
        &read("extras.json").await?,
    )
}

pub fn initial_settings(games: &[Game]) -> Settings {
    Settings {
        playoffs: games.iter().any(|g| g.playoff),
        num_pre_playoff_games: games.iter().filter(|g| !g.playoff).count() as i32,
        initialized_at: BsonDateTime::now(),
        ..Settings::default()
    }
}

const TOURNAMENT_COLLECTIONS: [&str; 5] = [
    bracket::COLLECTION,
    team::COLLECTION,
    playday::COLLECTION,
    game::COLLECTION,
    extra::COLLECTION,
];

/// Fails when an earlier import left documents behind.
fn ensure_empty(counts: &[(&str, u64)]) -> Result<()> {
    let filled: Vec<&str> = counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, _)| *name)
        .collect();
    if filled.is_empty() {
        Ok(())
    } else {
        Err(AppError::invalid_data(format!(
            "Collections already contain data: {}",
            filled.join(", ")
        )))
    }
}

async fn insert_tournament(db: &Database, data: &InitialData) -> Result<()> {
    if !data.brackets.is_empty() {
        data_service::brackets(db).insert_many(&data.brackets).await?;
    }
    if !data.teams.is_empty() {
        data_service::teams(db).insert_many(&data.teams).await?;
    }
    if !data.playdays.is_empty() {
        data_service::playdays(db).insert_many(&data.playdays).await?;
    }
    if !data.games.is_empty() {
        data_service::games(db).insert_many(&data.games).await?;
    }
    if !data.extras.is_empty() {
        data_service::extras(db).insert_many(&data.extras).await?;
    }
    Ok(())
}

/// Imports the tournament, creates settings, the admin and job descriptors.
pub async fn initialize(state: &AppState) -> Result<Settings> {
    let db = &state.db;
    if data_service::is_initialized(db).await? {
        return Err(AppError::AlreadyInitialized);
    }

    let data = read_initial_data(Path::new(&state.config.data_dir)).await?;
    tracing::info!(
        "Importing {} brackets, {} teams, {} playdays, {} games, {} extras",
        data.brackets.len(),
        data.teams.len(),
        data.playdays.len(),
        data.games.len(),
        data.extras.len()
    );

    let mut counts = Vec::new();
    for name in TOURNAMENT_COLLECTIONS {
        let count = db.collection::<Document>(name).count_documents(doc! {}).await?;
        counts.push((name, count));
    }
    ensure_empty(&counts)?;

    if let Err(e) = insert_tournament(db, &data).await {
        tracing::error!("Import failed, removing partial data: {}", e);
        for name in TOURNAMENT_COLLECTIONS {
            db.collection::<Document>(name).delete_many(doc! {}).await?;
        }
        return Err(e);
    }

    let settings = initial_settings(&data.games);
    data_service::settings(db).insert_one(&settings).await?;

    create_admin(state).await?;
    register_jobs(state).await?;
    calculation_service::calculate(state).await?;

    tracing::info!("Initialization finished");
    Ok(settings)
}

async fn create_admin(state: &AppState) -> Result<()> {
    let config = &state.config;
    if data_service::find_user_by_username(&state.db, &config.admin_username)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let mut admin = User::new_tipper(
        &config.admin_username,
        &config.admin_email,
        auth_service::hash_password(&config.admin_password)?,
        auth_service::gravatar_url(&config.admin_email),
    );
    admin.active = true;
    admin.admin = true;

    data_service::users(&state.db).insert_one(&admin).await?;
    tracing::info!("Admin user '{}' created", admin.username);
    Ok(())
}

pub async fn register_jobs(state: &AppState) -> Result<()> {
    let collection = data_service::jobs(&state.db);
    for descriptor in jobs::descriptors() {
        if collection
            .find_one(doc! { "name": &descriptor.name })
            .await?
            .is_none()
        {
            collection.insert_one(&descriptor).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BRACKETS: &str = r#"{"id": "b1", "name": "Group A", "number": 1, "updatable": true}
{"id": "b0", "name": "Final", "number": 2, "updatable": false}"#;
    const TEAMS: &str = r#"{"id": "t1", "name": "Spain", "flag": "es", "bracket": "b1"}
{"id": "t2", "name": "Italy", "flag": "it", "bracket": "b1"}"#;
    const PLAYDAYS: &str = r#"{"id": "p1", "name": "1st playday", "number": 1, "current": true}

{"id": "p2", "name": "Final", "number": 2, "playoff": true}"#;
    const GAMES: &str = r#"{"number": 1, "playday": "p1", "bracket": "b1", "homeTeam": "t1", "awayTeam": "t2", "kickoff": "2024-06-14 21:00:00", "webserviceID": "66721"}
{"number": 2, "playday": "p2", "homeReference": "B-1-1", "awayReference": "B-1-2", "kickoff": "2024-07-14 21:00:00", "playoff": true, "updatable": true}"#;
    const EXTRAS: &str = r#"{"question": "Who wins group A?", "questionShort": "Group A", "points": 5, "ending": "2024-06-14 20:55:00", "extraReference": "B-1-1"}"#;

    #[test]
    fn resolves_file_local_keys() {
        let data = parse_initial_data(BRACKETS, TEAMS, PLAYDAYS, GAMES, EXTRAS).unwrap();

        assert_eq!(data.brackets.len(), 2);
        assert_eq!(data.playdays.len(), 2);
        assert_eq!(data.teams[0].bracket, Some(1));

        let opener = &data.games[0];
        assert_eq!(opener.home_team, data.teams[0].id);
        assert_eq!(opener.away_team, data.teams[1].id);
        assert_eq!(opener.bracket, Some(1));
        assert_eq!(opener.webservice_id.as_deref(), Some("66721"));
        assert_eq!(
            opener.kickoff.to_chrono().format(DATE_FORMAT).to_string(),
            "2024-06-14 21:00:00"
        );

        let final_game = &data.games[1];
        assert_eq!(final_game.playday, 2);
        assert!(final_game.playoff && final_game.updatable);
        assert_eq!(final_game.home_team, None);

        assert_eq!(data.extras[0].answers.len(), 2);
        assert_eq!(data.extras[0].extra_reference.as_deref(), Some("B-1-1"));

        let settings = initial_settings(&data.games);
        assert!(settings.playoffs);
        assert_eq!(settings.num_pre_playoff_games, 1);
    }

    #[test]
    fn refuses_import_over_leftover_data() {
        assert!(ensure_empty(&[("brackets", 0), ("teams", 0)]).is_ok());

        let err = ensure_empty(&[("brackets", 2), ("teams", 0), ("games", 5)]).unwrap_err();
        assert!(err.to_string().contains("brackets, games"));
    }

    #[test]
    fn unknown_keys_are_reported() {
        let games = r#"{"number": 1, "playday": "p9", "kickoff": "2024-06-14 21:00:00"}"#;
        let err = parse_initial_data(BRACKETS, TEAMS, PLAYDAYS, games, "").unwrap_err();
        assert!(err.to_string().contains("Unknown playday 'p9'"));
    }

    #[tokio::test]
    async fn reads_files_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in [
            ("brackets.json", BRACKETS),
            ("teams.json", TEAMS),
            ("playdays.json", PLAYDAYS),
            ("games.json", GAMES),
            ("extras.json", EXTRAS),
        ] {
            let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
            file.write_all(content.as_bytes()).unwrap();
        }

        let data = read_initial_data(dir.path()).await.unwrap();
        assert_eq!(data.games.len(), 2);

        let missing = tempfile::tempdir().unwrap();
        assert!(matches!(read_initial_data(missing.path()).await, Err(AppError::Io(_))));
    }
}
