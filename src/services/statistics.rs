use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{game::Game, game_tip::GameTip};
use crate::services::scoring::{PointRules, Score, TipOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaydayStatistic {
    pub playday: i32,
    pub points: i32,
    pub tips: i32,
    pub correct_results: i32,
    pub correct_differences: i32,
    pub correct_trends: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCount {
    pub result: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub playdays: Vec<PlaydayStatistic>,
    pub results: Vec<ResultCount>,
    pub tipped_results: Vec<ResultCount>,
}

/// Aggregates scored tips per playday.
pub fn playday_statistics(games: &[Game], tips: &[GameTip], rules: &PointRules) -> Vec<PlaydayStatistic> {
    let results: HashMap<_, Score> = games
        .iter()
        .filter_map(|g| Some((g.id?, g.regular_result()?)))
        .collect();

    let mut per_playday: BTreeMap<i32, PlaydayStatistic> = BTreeMap::new();
    for tip in tips {
        let Some(&result) = results.get(&tip.game_id) else {
            continue;
        };
        let entry = per_playday.entry(tip.playday).or_insert_with(|| PlaydayStatistic {
            playday: tip.playday,
            ..Default::default()
        });

        let outcome = TipOutcome::evaluate(result, tip.score());
        entry.tips += 1;
        entry.points += outcome.points(rules);
        match outcome {
            TipOutcome::Exact => entry.correct_results += 1,
            TipOutcome::Difference => entry.correct_differences += 1,
            TipOutcome::Trend => entry.correct_trends += 1,
            TipOutcome::Miss => {}
        }
    }

    per_playday.into_values().collect()
}

pub fn count_results(scores: impl IntoIterator<Item = Score>) -> Vec<ResultCount> {
    let mut counts: HashMap<Score, usize> = HashMap::new();
    for score in scores {
        *counts.entry(score).or_insert(0) += 1;
    }

    let mut sorted: Vec<(Score, usize)> = counts.into_iter().collect();
    sorted.sort_by(|(a, x), (b, y)| y.cmp(x).then((a.home, a.away).cmp(&(b.home, b.away))));

    sorted
        .into_iter()
        .map(|(score, count)| ResultCount {
            result: score.to_string(),
            count,
        })
        .collect()
}

pub fn game_results(games: &[Game]) -> Vec<ResultCount> {
    count_results(games.iter().filter_map(|g| g.regular_result()))
}

pub fn tipped_results(tips: &[GameTip]) -> Vec<ResultCount> {
    count_results(tips.iter().map(|t| t.score()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::test_game;
    use crate::models::settings::Settings;
    use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

    fn tip_on(game: &Game, home: i32, away: i32) -> GameTip {
        GameTip {
            id: None,
            user_id: ObjectId::new(),
            game_id: game.id.unwrap_or_default(),
            playday: game.playday,
            home_score: home,
            away_score: away,
            points: None,
            placed: BsonDateTime::now(),
        }
    }

    #[test]
    fn sums_points_per_playday() {
        let mut game = test_game(1, None, None);
        game.ended = true;
        game.home_score = Some(1);
        game.away_score = Some(0);
        let open = test_game(2, None, None);

        let tips = vec![tip_on(&game, 1, 0), tip_on(&game, 2, 1), tip_on(&game, 0, 0), tip_on(&open, 3, 3)];
        let stats = playday_statistics(&[game, open], &tips, &PointRules::from(&Settings::default()));

        assert_eq!(
            stats,
            vec![PlaydayStatistic {
                playday: 1,
                points: 6,
                tips: 3,
                correct_results: 1,
                correct_differences: 1,
                correct_trends: 0,
            }]
        );
    }

    #[test]
    fn most_frequent_results_first() {
        let counts = count_results(vec![
            Score::new(1, 0),
            Score::new(2, 1),
            Score::new(1, 0),
            Score::new(0, 0),
        ]);
        assert_eq!(counts[0], ResultCount { result: "1 : 0".to_string(), count: 2 });
        assert_eq!(counts[1].result, "0 : 0");
        assert_eq!(counts.len(), 3);
    }
}
