use std::collections::HashMap;

use chrono::{Duration, Utc};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

use crate::errors::Result;
use crate::models::{game::Game, game_tip::GameTip, user::User};
use crate::services::data_service::{self, find_all};
use crate::services::mail_service::TipLine;
use crate::services::presentation::{self, TeamNames};
use crate::state::AppState;

/// Every tip on `games`, grouped by game in game order.
pub fn tip_lines(games: &[Game], tips: &[GameTip], users: &[User], teams: &TeamNames) -> Vec<TipLine> {
    let names: HashMap<ObjectId, &str> = users
        .iter()
        .filter_map(|u| Some((u.id?, u.username.as_str())))
        .collect();

    let mut lines = Vec::new();
    for game in games {
        let title = presentation::game_title(game, teams, &[]);
        let mut game_lines: Vec<TipLine> = tips
            .iter()
            .filter(|tip| Some(tip.game_id) == game.id)
            .filter_map(|tip| {
                Some(TipLine {
                    game: title.clone(),
                    username: names.get(&tip.user_id)?.to_string(),
                    tip: tip.score().to_string(),
                })
            })
            .collect();
        game_lines.sort_by(|a, b| a.username.to_lowercase().cmp(&b.username.to_lowercase()));
        lines.extend(game_lines);
    }
    lines
}

/// Sends the tips of games that just closed for tipping.
pub async fn run(state: &AppState) -> Result<()> {
    let db = &state.db;
    let settings = data_service::get_settings(db).await?;
    let closed_before = BsonDateTime::from_chrono(Utc::now() + Duration::minutes(settings.minutes_before_tip));

    let games = find_all(
        &data_service::games(db),
        doc! { "informed": false, "kickoff": { "$lte": closed_before } },
        doc! { "number": 1 },
    )
    .await?;
    if games.is_empty() {
        return Ok(());
    }

    let game_ids: Vec<ObjectId> = games.iter().filter_map(|g| g.id).collect();
    let tips = find_all(
        &data_service::game_tips(db),
        doc! { "game_id": { "$in": game_ids.clone() } },
        doc! {},
    )
    .await?;
    let users = find_all(&data_service::users(db), doc! { "active": true }, doc! { "username": 1 }).await?;
    let teams = data_service::team_names(db).await?;
    let lines = tip_lines(&games, &tips, &users, &teams);

    if !lines.is_empty() {
        for user in users.iter().filter(|u| u.send_game_tips) {
            if let Err(e) = state.mail.game_tips(&settings, user, &lines).await {
                tracing::error!("Game tips mail to {} failed: {}", user.username, e);
            }
        }
    }

    data_service::games(db)
        .update_many(doc! { "_id": { "$in": game_ids } }, doc! { "$set": { "informed": true } })
        .await?;
    tracing::info!("Informed about tips on {} games", games.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::test_game;
    use crate::models::team::Team;

    #[test]
    fn lines_follow_game_then_username() {
        let spain = Team::new("Spain", "es", Some(1));
        let italy = Team::new("Italy", "it", Some(1));
        let teams: TeamNames = [(spain.id.unwrap(), "Spain".to_string()), (italy.id.unwrap(), "Italy".to_string())]
            .into_iter()
            .collect();
        let games = vec![test_game(1, spain.id, italy.id), test_game(2, italy.id, spain.id)];

        let mut bert = User::new_tipper("bert", "bert@example.com", String::new(), String::new());
        bert.active = true;
        let mut anna = User::new_tipper("Anna", "anna@example.com", String::new(), String::new());
        anna.active = true;

        let tip = |user: &User, game: &Game, home, away| GameTip {
            id: None,
            user_id: user.id.unwrap(),
            game_id: game.id.unwrap(),
            playday: 1,
            home_score: home,
            away_score: away,
            points: None,
            placed: BsonDateTime::now(),
        };
        let tips = vec![tip(&bert, &games[1], 0, 0), tip(&bert, &games[0], 1, 0), tip(&anna, &games[0], 2, 2)];

        let lines = tip_lines(&games, &tips, &[bert.clone(), anna.clone()], &teams);
        let rendered: Vec<String> = lines
            .iter()
            .map(|l| format!("{} {} {}", l.game, l.username, l.tip))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "Spain - Italy Anna 2 : 2",
                "Spain - Italy bert 1 : 0",
                "Italy - Spain bert 0 : 0",
            ]
        );
    }
}
