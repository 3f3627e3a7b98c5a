use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::{bracket, confirmation, extra_tip, game, game_tip, playday, user};

pub async fn get_db_client(config: &AppConfig) -> Result<Database> {
    let client = Client::with_uri_str(&config.database_url).await?;
    let db = client.database(&config.database_name);

    // Verify database is reachable
    db.run_command(doc! { "ping": 1 }).await?;
    let collections = db.list_collection_names().await?;
    tracing::info!(
        "Connected to database '{}' ({} collections)",
        config.database_name,
        collections.len()
    );

    Ok(db)
}

fn unique(keys: Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

pub async fn create_indexes(db: &Database) -> Result<()> {
    let indexes: [(&str, Document); 9] = [
        (user::COLLECTION, doc! { "email": 1 }),
        (user::COLLECTION, doc! { "username": 1 }),
        (game_tip::COLLECTION, doc! { "user_id": 1, "game_id": 1 }),
        (extra_tip::COLLECTION, doc! { "user_id": 1, "extra_id": 1 }),
        (game::COLLECTION, doc! { "number": 1 }),
        (playday::COLLECTION, doc! { "number": 1 }),
        (bracket::COLLECTION, doc! { "number": 1 }),
        (confirmation::COLLECTION, doc! { "token": 1 }),
        (crate::models::job::COLLECTION, doc! { "name": 1 }),
    ];

    for (collection, keys) in indexes {
        db.collection::<Document>(collection)
            .create_index(unique(keys))
            .await?;
    }
    tracing::info!("Database indexes ensured");
    Ok(())
}
