//! Recalculation of everything that depends on results.
//!
//! Works on an in-memory [`Tournament`] so the rules can be exercised
//! without a database; `calculation_service` loads and persists it.

use std::collections::HashMap;

use mongodb::bson::{doc, oid::ObjectId, Document};

use crate::models::{
    extra::Extra, extra_tip::ExtraTip, game::Game, game_tip::GameTip, playday::Playday,
    settings::Settings, team::Team, user::User,
};
use crate::services::brackets::{self, ReferenceResolver, TableRules};
use crate::services::scoring::{PointRules, Score, Tally, TipOutcome};
use crate::services::standings;

/// A document with fields owned by [`Tournament::recalculate`].
///
/// Only these fields are written back, so profile edits, kickoff updates
/// or mail flags stored while a calculation runs survive it.
pub trait Calculated {
    fn document_id(&self) -> Option<ObjectId>;
    fn calculated_fields(&self) -> Document;
}

impl Calculated for User {
    fn document_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn calculated_fields(&self) -> Document {
        doc! {
            "points": self.points,
            "tip_points": self.tip_points,
            "extra_points": self.extra_points,
            "place": self.place,
            "previous_place": self.previous_place,
            "correct_results": self.correct_results,
            "correct_differences": self.correct_differences,
            "correct_trends": self.correct_trends,
            "correct_extra_tips": self.correct_extra_tips,
        }
    }
}

impl Calculated for Team {
    fn document_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn calculated_fields(&self) -> Document {
        doc! {
            "points": self.points,
            "goals_for": self.goals_for,
            "goals_against": self.goals_against,
            "goals_diff": self.goals_diff,
            "games_played": self.games_played,
            "games_won": self.games_won,
            "games_draw": self.games_draw,
            "games_lost": self.games_lost,
            "place": self.place,
            "previous_place": self.previous_place,
        }
    }
}

impl Calculated for Game {
    fn document_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn calculated_fields(&self) -> Document {
        doc! { "home_team": self.home_team, "away_team": self.away_team }
    }
}

impl Calculated for Extra {
    fn document_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn calculated_fields(&self) -> Document {
        doc! { "answer": self.answer }
    }
}

impl Calculated for GameTip {
    fn document_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn calculated_fields(&self) -> Document {
        doc! { "points": self.points }
    }
}

impl Calculated for ExtraTip {
    fn document_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn calculated_fields(&self) -> Document {
        doc! { "points": self.points }
    }
}

impl Calculated for Playday {
    fn document_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn calculated_fields(&self) -> Document {
        doc! { "current": self.current }
    }
}

/// `$set` bodies for every document whose calculated fields changed.
pub fn changed_fields<T: Calculated>(before: &[T], after: &[T]) -> Vec<(ObjectId, Document)> {
    let previous: HashMap<ObjectId, Document> = before
        .iter()
        .filter_map(|d| Some((d.document_id()?, d.calculated_fields())))
        .collect();

    after
        .iter()
        .filter_map(|document| {
            let id = document.document_id()?;
            let fields = document.calculated_fields();
            (previous.get(&id) != Some(&fields)).then_some((id, fields))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Tournament {
    pub settings: Settings,
    pub users: Vec<User>,
    pub teams: Vec<Team>,
    pub games: Vec<Game>,
    pub playdays: Vec<Playday>,
    pub extras: Vec<Extra>,
    pub game_tips: Vec<GameTip>,
    pub extra_tips: Vec<ExtraTip>,
}

impl Tournament {
    pub fn recalculate(&mut self) {
        let rules = PointRules::from(&self.settings);

        brackets::compute_tables(&mut self.teams, &self.games, TableRules::from(&self.settings));
        brackets::resolve_playoff_teams(&mut self.games, &self.teams);
        self.resolve_extras();

        let tallies = self.score_tips(&rules);
        self.update_users(&tallies);
        self.mark_current_playday();
    }

    fn resolve_extras(&mut self) {
        let resolver = ReferenceResolver::new(&self.games, &self.teams);
        for extra in self.extras.iter_mut().filter(|e| e.answer.is_none()) {
            if let Some(reference) = extra.extra_reference.as_deref() {
                if let Some(team) = resolver.resolve_str(reference) {
                    tracing::info!("Extra '{}' resolved from reference {}", extra.question_short, reference);
                    extra.answer = Some(team);
                }
            }
        }
    }

    fn score_tips(&mut self, rules: &PointRules) -> HashMap<ObjectId, Tally> {
        let results: HashMap<ObjectId, Score> = self
            .games
            .iter()
            .filter_map(|g| Some((g.id?, g.regular_result()?)))
            .collect();

        let mut tallies: HashMap<ObjectId, Tally> = HashMap::new();

        for tip in self.game_tips.iter_mut() {
            match results.get(&tip.game_id) {
                Some(&result) => {
                    let outcome = TipOutcome::evaluate(result, tip.score());
                    tip.points = Some(outcome.points(rules));
                    tallies.entry(tip.user_id).or_default().add_game_tip(outcome, rules);
                }
                None => tip.points = None,
            }
        }

        let extras: HashMap<ObjectId, &Extra> =
            self.extras.iter().filter_map(|e| Some((e.id?, e))).collect();

        for tip in self.extra_tips.iter_mut() {
            let resolved = extras
                .get(&tip.extra_id)
                .and_then(|extra| extra.answer.map(|answer| (answer, extra.points)));
            match resolved {
                Some((answer, points)) => {
                    let earned = if answer == tip.answer { points } else { 0 };
                    tip.points = Some(earned);
                    tallies.entry(tip.user_id).or_default().add_extra_tip(earned);
                }
                None => tip.points = None,
            }
        }

        tallies
    }

    fn update_users(&mut self, tallies: &HashMap<ObjectId, Tally>) {
        for user in self.users.iter_mut() {
            let tally = user
                .id
                .and_then(|id| tallies.get(&id).copied())
                .unwrap_or_default();
            user.tip_points = tally.tip_points;
            user.extra_points = tally.extra_points;
            user.points = tally.points();
            user.correct_results = tally.correct_results;
            user.correct_differences = tally.correct_differences;
            user.correct_trends = tally.correct_trends;
            user.correct_extra_tips = tally.correct_extra_tips;
        }

        let (mut active, inactive): (Vec<User>, Vec<User>) =
            self.users.drain(..).partition(|u| u.active);
        standings::rank(&mut active);
        self.users = active;
        self.users.extend(inactive.into_iter().map(|mut user| {
            user.place = 0;
            user
        }));
    }

    fn mark_current_playday(&mut self) {
        let open: Vec<i32> = self
            .games
            .iter()
            .filter(|g| !g.ended)
            .map(|g| g.playday)
            .collect();

        let current = self
            .playdays
            .iter()
            .map(|p| p.number)
            .filter(|n| open.contains(n))
            .min()
            .or_else(|| self.playdays.iter().map(|p| p.number).max());

        for playday in self.playdays.iter_mut() {
            playday.current = Some(playday.number) == current;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::test_game;
    use mongodb::bson::DateTime as BsonDateTime;

    fn tipper(name: &str) -> User {
        let mut user = User::new_tipper(name, &format!("{}@example.com", name), String::new(), String::new());
        user.active = true;
        user
    }

    fn tip(user: &User, game: &Game, home: i32, away: i32) -> GameTip {
        GameTip {
            id: Some(ObjectId::new()),
            user_id: user.id.unwrap_or_default(),
            game_id: game.id.unwrap_or_default(),
            playday: game.playday,
            home_score: home,
            away_score: away,
            points: None,
            placed: BsonDateTime::now(),
        }
    }

    fn playday(number: i32) -> Playday {
        Playday {
            id: Some(ObjectId::new()),
            number,
            name: format!("Playday {}", number),
            current: false,
            playoff: false,
        }
    }

    fn tournament() -> Tournament {
        let teams = vec![
            Team::new("Spain", "es", Some(1)),
            Team::new("Italy", "it", Some(1)),
        ];
        let mut first = test_game(1, teams[0].id, teams[1].id);
        first.ended = true;
        first.home_score = Some(2);
        first.away_score = Some(1);
        let mut second = test_game(2, teams[1].id, teams[0].id);
        second.playday = 2;

        let mut final_game = test_game(3, None, None);
        final_game.playday = 3;
        final_game.playoff = true;
        final_game.updatable = true;
        final_game.bracket = None;
        final_game.home_reference = Some("G-2-W".to_string());
        final_game.away_reference = Some("B-1-2".to_string());

        let anna = tipper("anna");
        let bert = tipper("bert");
        let mut carl = tipper("carl");
        carl.active = false;

        let extra = Extra {
            id: Some(ObjectId::new()),
            question: "Who wins the group?".to_string(),
            question_short: "Group winner".to_string(),
            points: 5,
            answers: teams.iter().filter_map(|t| t.id).collect(),
            answer: None,
            ending: BsonDateTime::now(),
            extra_reference: Some("B-1-1".to_string()),
            reminder: false,
        };

        let game_tips = vec![tip(&anna, &first, 2, 1), tip(&bert, &first, 1, 0), tip(&anna, &second, 0, 0)];
        let extra_tips = vec![ExtraTip {
            id: Some(ObjectId::new()),
            user_id: bert.id.unwrap_or_default(),
            extra_id: extra.id.unwrap_or_default(),
            answer: teams[0].id.unwrap_or_default(),
            points: None,
            placed: BsonDateTime::now(),
        }];

        Tournament {
            settings: Settings::default(),
            users: vec![bert, carl, anna],
            teams,
            games: vec![first, second, final_game],
            playdays: vec![playday(1), playday(2), playday(3)],
            extras: vec![extra],
            game_tips,
            extra_tips,
        }
    }

    #[test]
    fn scores_tips_of_ended_games_only() {
        let mut t = tournament();
        t.recalculate();

        assert_eq!(t.game_tips[0].points, Some(4));
        assert_eq!(t.game_tips[1].points, Some(2));
        assert_eq!(t.game_tips[2].points, None);
    }

    #[test]
    fn ranks_active_users_and_parks_inactive_ones() {
        let mut t = tournament();
        t.recalculate();

        let anna = t.users.iter().find(|u| u.username == "anna").unwrap();
        assert_eq!(anna.points, 4);
        assert_eq!(anna.correct_results, 1);
        assert_eq!(anna.place, 1);

        let bert = t.users.iter().find(|u| u.username == "bert").unwrap();
        assert_eq!(bert.tip_points, 2);
        assert_eq!(bert.correct_differences, 1);
        assert_eq!(bert.place, 2);

        let carl = t.users.iter().find(|u| u.username == "carl").unwrap();
        assert_eq!(carl.place, 0);
    }

    #[test]
    fn completes_bracket_then_resolves_extras_and_playoffs() {
        let mut t = tournament();
        t.recalculate();
        assert_eq!(t.extras[0].answer, None);
        assert_eq!(t.games[2].away_team, None);
        assert!(t.playdays[1].current);

        t.games[1].ended = true;
        t.games[1].home_score = Some(0);
        t.games[1].away_score = Some(3);
        t.recalculate();

        // Spain won both games
        assert_eq!(t.extras[0].answer, t.teams[0].id);
        assert_eq!(t.games[2].home_team, t.teams[0].id);
        assert_eq!(t.games[2].away_team, t.teams[1].id);

        let bert = t.users.iter().find(|u| u.username == "bert").unwrap();
        assert_eq!(bert.extra_points, 5);
        assert_eq!(bert.points, 7);
        assert_eq!(bert.place, 1);
        assert!(t.playdays[2].current);
    }

    fn by_place(users: &[User]) -> Vec<String> {
        let mut listed: Vec<&User> = users.iter().filter(|u| u.active).collect();
        listed.sort_by(|a, b| (a.place, &a.username).cmp(&(b.place, &b.username)));
        listed.iter().map(|u| u.username.clone()).collect()
    }

    #[test]
    fn activated_tipper_joins_the_standings_behind_the_leaders() {
        let mut t = tournament();
        t.recalculate();

        let carl = t.users.iter_mut().find(|u| u.username == "carl").unwrap();
        carl.active = true;
        assert_eq!(carl.place, 0);

        t.recalculate();
        assert_eq!(by_place(&t.users), vec!["anna", "bert", "carl"]);
        let carl = t.users.iter().find(|u| u.username == "carl").unwrap();
        assert_eq!((carl.points, carl.place), (0, 3));
    }

    #[test]
    fn unchanged_recalculation_keeps_places_as_previous() {
        let mut t = tournament();
        t.recalculate();
        t.recalculate();

        let anna = t.users.iter().find(|u| u.username == "anna").unwrap();
        assert_eq!((anna.place, anna.previous_place), (1, 1));
        assert_eq!(standings::PlaceTrend::of(anna), standings::PlaceTrend::Same);
    }

    #[test]
    fn writes_back_only_changed_calculated_fields() {
        let before = tournament();
        let mut after = before.clone();
        after.recalculate();

        let users = changed_fields(&before.users, &after.users);
        assert!(!users.is_empty());
        for (_, fields) in &users {
            assert!(fields.contains_key("points"));
            assert!(!fields.contains_key("email"));
            assert!(!fields.contains_key("send_game_tips"));
        }

        let tips = changed_fields(&before.game_tips, &after.game_tips);
        assert_eq!(tips.len(), 2);
        assert_eq!(tips[0].1, doc! { "points": 4 });

        for (_, fields) in changed_fields(&before.games, &after.games) {
            assert!(!fields.contains_key("kickoff"));
            assert!(!fields.contains_key("informed"));
        }

        // a second pass over stable data writes nothing new for tips
        let mut again = after.clone();
        again.recalculate();
        assert!(changed_fields(&after.game_tips, &again.game_tips).is_empty());
        assert!(changed_fields(&after.playdays, &again.playdays).is_empty());
    }
}
