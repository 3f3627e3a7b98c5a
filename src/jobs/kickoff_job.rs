use mongodb::bson::{doc, DateTime as BsonDateTime};

use crate::errors::Result;
use crate::services::data_service::{self, find_all};
use crate::services::openliga_service::OpenLigaService;
use crate::state::AppState;

/// Playdays after the current one whose kickoffs are refreshed as well.
const LOOKAHEAD: i32 = 3;

pub async fn run(state: &AppState) -> Result<()> {
    let db = &state.db;
    let Some(current) = data_service::current_playday(db).await? else {
        return Ok(());
    };

    let openliga = OpenLigaService::new(&state.config.openliga_url, state.http.clone());
    let games = find_all(
        &data_service::games(db),
        doc! {
            "playday": { "$gte": current.number, "$lte": current.number + LOOKAHEAD },
            "webservice_id": { "$ne": null },
            "ended": false,
        },
        doc! { "number": 1 },
    )
    .await?;

    for game in games {
        let (Some(id), Some(match_id)) = (game.id, game.webservice_id.as_deref()) else {
            continue;
        };
        let data = match openliga.match_data(match_id).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Kickoff update for game {} failed: {}", game.number, e);
                continue;
            }
        };
        let Some(kickoff) = data.match_date_time_utc else {
            continue;
        };

        let kickoff = BsonDateTime::from_chrono(kickoff);
        if kickoff != game.kickoff {
            data_service::games(db)
                .update_one(doc! { "_id": id }, doc! { "$set": { "kickoff": kickoff } })
                .await?;
            tracing::info!("Updated kickoff of game {} to {}", game.number, kickoff);
        }
    }
    Ok(())
}
