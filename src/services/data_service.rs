//! Typed collection access shared by handlers and jobs.

use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::{Collection, Database};
use serde::de::DeserializeOwned;

use crate::errors::{AppError, Result};
use crate::models::{
    bracket::{self, Bracket},
    confirmation::{self, Confirmation},
    extra::{self, Extra},
    extra_tip::{self, ExtraTip},
    game::{self, Game},
    game_tip::{self, GameTip},
    job::{self, JobDescriptor},
    playday::{self, Playday},
    settings::{self, Settings},
    team::{self, Team},
    user::{self, User},
};

pub fn users(db: &Database) -> Collection<User> {
    db.collection(user::COLLECTION)
}

pub fn settings(db: &Database) -> Collection<Settings> {
    db.collection(settings::COLLECTION)
}

pub fn confirmations(db: &Database) -> Collection<Confirmation> {
    db.collection(confirmation::COLLECTION)
}

pub fn brackets(db: &Database) -> Collection<Bracket> {
    db.collection(bracket::COLLECTION)
}

pub fn teams(db: &Database) -> Collection<Team> {
    db.collection(team::COLLECTION)
}

pub fn playdays(db: &Database) -> Collection<Playday> {
    db.collection(playday::COLLECTION)
}

pub fn games(db: &Database) -> Collection<Game> {
    db.collection(game::COLLECTION)
}

pub fn game_tips(db: &Database) -> Collection<GameTip> {
    db.collection(game_tip::COLLECTION)
}

pub fn extras(db: &Database) -> Collection<Extra> {
    db.collection(extra::COLLECTION)
}

pub fn extra_tips(db: &Database) -> Collection<ExtraTip> {
    db.collection(extra_tip::COLLECTION)
}

pub fn jobs(db: &Database) -> Collection<JobDescriptor> {
    db.collection(job::COLLECTION)
}

pub fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| AppError::InvalidObjectId(id.to_string()))
}

pub async fn find_all<T>(collection: &Collection<T>, filter: Document, sort: Document) -> Result<Vec<T>>
where
    T: DeserializeOwned + Send + Sync,
{
    let cursor = collection.find(filter).sort(sort).await?;
    Ok(cursor.try_collect().await?)
}

pub async fn get_settings(db: &Database) -> Result<Settings> {
    settings(db).find_one(doc! {}).await?.ok_or(AppError::NotInitialized)
}

pub async fn is_initialized(db: &Database) -> Result<bool> {
    Ok(settings(db).count_documents(doc! {}).await? > 0)
}

pub async fn find_user(db: &Database, id: ObjectId) -> Result<User> {
    users(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::DocumentNotFound)
}

pub async fn find_user_by_username(db: &Database, username: &str) -> Result<Option<User>> {
    Ok(users(db).find_one(doc! { "username": username }).await?)
}

pub async fn find_user_by_email(db: &Database, email: &str) -> Result<Option<User>> {
    Ok(users(db).find_one(doc! { "email": email }).await?)
}

pub async fn active_users(db: &Database) -> Result<Vec<User>> {
    find_all(&users(db), doc! { "active": true }, doc! { "place": 1, "username": 1 }).await
}

pub async fn admins(db: &Database) -> Result<Vec<User>> {
    find_all(&users(db), doc! { "admin": true, "active": true }, doc! { "username": 1 }).await
}

pub async fn find_game(db: &Database, id: ObjectId) -> Result<Game> {
    games(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::DocumentNotFound)
}

pub async fn find_extra(db: &Database, id: ObjectId) -> Result<Extra> {
    extras(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::DocumentNotFound)
}

pub async fn all_games(db: &Database) -> Result<Vec<Game>> {
    find_all(&games(db), doc! {}, doc! { "number": 1 }).await
}

pub async fn all_teams(db: &Database) -> Result<Vec<Team>> {
    find_all(&teams(db), doc! {}, doc! { "bracket": 1, "place": 1, "name": 1 }).await
}

pub async fn all_brackets(db: &Database) -> Result<Vec<Bracket>> {
    find_all(&brackets(db), doc! {}, doc! { "number": 1 }).await
}

pub async fn all_playdays(db: &Database) -> Result<Vec<Playday>> {
    find_all(&playdays(db), doc! {}, doc! { "number": 1 }).await
}

pub async fn all_extras(db: &Database) -> Result<Vec<Extra>> {
    find_all(&extras(db), doc! {}, doc! { "ending": 1 }).await
}

pub async fn current_playday(db: &Database) -> Result<Option<Playday>> {
    if let Some(playday) = playdays(db).find_one(doc! { "current": true }).await? {
        return Ok(Some(playday));
    }
    Ok(playdays(db).find_one(doc! {}).sort(doc! { "number": -1 }).await?)
}

/// Team names keyed by id, for titles and mails.
pub async fn team_names(db: &Database) -> Result<crate::services::presentation::TeamNames> {
    let teams = all_teams(db).await?;
    Ok(crate::services::mail_service::team_names(&teams))
}
