use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;

use crate::models::{game::Game, settings::Settings, team::Team};
use crate::services::scoring::{Score, Trend};

/// Where a playoff slot or an extra answer gets its team from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    WinnerOf(i32),
    LoserOf(i32),
    BracketPlace { bracket: i32, place: i32 },
}

impl Reference {
    /// Parses `G-<game>-W`, `G-<game>-L` and `B-<bracket>-<place>`.
    pub fn parse(reference: &str) -> Option<Self> {
        let parts: Vec<&str> = reference.trim().split('-').collect();
        if parts.len() != 3 {
            return None;
        }
        let number: i32 = parts[1].parse().ok()?;
        match (parts[0], parts[2]) {
            ("G", "W") => Some(Reference::WinnerOf(number)),
            ("G", "L") => Some(Reference::LoserOf(number)),
            ("B", place) => Some(Reference::BracketPlace {
                bracket: number,
                place: place.parse().ok()?,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableRules {
    pub win: i32,
    pub draw: i32,
}

impl From<&Settings> for TableRules {
    fn from(settings: &Settings) -> Self {
        TableRules {
            win: settings.points_game_win,
            draw: settings.points_game_draw,
        }
    }
}

/// Rebuilds every bracket table from the ended group games.
pub fn compute_tables(teams: &mut [Team], games: &[Game], rules: TableRules) {
    for team in teams.iter_mut().filter(|t| t.bracket.is_some()) {
        team.reset_table();
    }

    let index: HashMap<ObjectId, usize> = teams
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.id.map(|id| (id, i)))
        .collect();

    for game in games.iter().filter(|g| !g.playoff) {
        let (Some(result), Some(home), Some(away)) =
            (game.regular_result(), game.home_team, game.away_team)
        else {
            continue;
        };
        let (Some(&h), Some(&a)) = (index.get(&home), index.get(&away)) else {
            continue;
        };

        apply(&mut teams[h], result.home, result.away, rules);
        apply(&mut teams[a], result.away, result.home, rules);
    }

    let mut by_bracket: HashMap<i32, Vec<usize>> = HashMap::new();
    for (i, team) in teams.iter().enumerate() {
        if let Some(bracket) = team.bracket {
            by_bracket.entry(bracket).or_default().push(i);
        }
    }

    for members in by_bracket.values_mut() {
        members.sort_by(|&x, &y| {
            let (a, b) = (&teams[x], &teams[y]);
            b.points
                .cmp(&a.points)
                .then(b.goals_diff.cmp(&a.goals_diff))
                .then(b.goals_for.cmp(&a.goals_for))
                .then(a.name.cmp(&b.name))
        });
        for (position, &i) in members.iter().enumerate() {
            let place = position as i32 + 1;
            let team = &mut teams[i];
            team.previous_place = team.place;
            team.place = place;
        }
    }
}

fn apply(team: &mut Team, scored: i32, conceded: i32, rules: TableRules) {
    team.games_played += 1;
    team.goals_for += scored;
    team.goals_against += conceded;
    team.goals_diff = team.goals_for - team.goals_against;
    match Score::new(scored, conceded).trend() {
        Trend::Home => {
            team.games_won += 1;
            team.points += rules.win;
        }
        Trend::Draw => {
            team.games_draw += 1;
            team.points += rules.draw;
        }
        Trend::Away => team.games_lost += 1,
    }
}

pub struct ReferenceResolver<'a> {
    games: HashMap<i32, &'a Game>,
    all_games: &'a [Game],
    teams: &'a [Team],
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(games: &'a [Game], teams: &'a [Team]) -> Self {
        ReferenceResolver {
            games: games.iter().map(|g| (g.number, g)).collect(),
            all_games: games,
            teams,
        }
    }

    pub fn bracket_complete(&self, bracket: i32) -> bool {
        let mut games = self
            .all_games
            .iter()
            .filter(|g| !g.playoff && g.bracket == Some(bracket))
            .peekable();
        games.peek().is_some() && games.all(|g| g.ended)
    }

    /// The decided team, or `None` while the source is still open.
    pub fn resolve(&self, reference: Reference) -> Option<ObjectId> {
        match reference {
            Reference::WinnerOf(number) => self.games.get(&number)?.winner(),
            Reference::LoserOf(number) => self.games.get(&number)?.loser(),
            Reference::BracketPlace { bracket, place } => {
                if !self.bracket_complete(bracket) {
                    return None;
                }
                self.teams
                    .iter()
                    .find(|t| t.bracket == Some(bracket) && t.place == place)
                    .and_then(|t| t.id)
            }
        }
    }

    pub fn resolve_str(&self, reference: &str) -> Option<ObjectId> {
        self.resolve(Reference::parse(reference)?)
    }
}

/// Fills unresolved playoff slots. Returns how many slots were set.
pub fn resolve_playoff_teams(games: &mut [Game], teams: &[Team]) -> usize {
    let snapshot = games.to_vec();
    let resolver = ReferenceResolver::new(&snapshot, teams);
    let mut resolved = 0;

    for game in games.iter_mut().filter(|g| g.playoff && g.updatable && !g.ended) {
        if let Some(reference) = game.home_reference.as_deref() {
            if let Some(team) = resolver.resolve_str(reference) {
                if game.home_team != Some(team) {
                    game.home_team = Some(team);
                    resolved += 1;
                }
            }
        }
        if let Some(reference) = game.away_reference.as_deref() {
            if let Some(team) = resolver.resolve_str(reference) {
                if game.away_team != Some(team) {
                    game.away_team = Some(team);
                    resolved += 1;
                }
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::test_game;

    fn ended(mut game: Game, home: i32, away: i32) -> Game {
        game.ended = true;
        game.home_score = Some(home);
        game.away_score = Some(away);
        game
    }

    fn group() -> (Vec<Team>, Vec<Game>) {
        let teams = vec![
            Team::new("Germany", "de", Some(1)),
            Team::new("Scotland", "sc", Some(1)),
            Team::new("Hungary", "hu", Some(1)),
        ];
        let id = |i: usize| teams[i].id;
        let games = vec![
            ended(test_game(1, id(0), id(1)), 5, 1),
            ended(test_game(2, id(1), id(2)), 1, 1),
            ended(test_game(3, id(2), id(0)), 0, 2),
        ];
        (teams, games)
    }

    #[test]
    fn parses_references() {
        assert_eq!(Reference::parse("G-49-W"), Some(Reference::WinnerOf(49)));
        assert_eq!(Reference::parse("G-61-L"), Some(Reference::LoserOf(61)));
        assert_eq!(
            Reference::parse("B-3-2"),
            Some(Reference::BracketPlace { bracket: 3, place: 2 })
        );
        assert_eq!(Reference::parse("X-1-1"), None);
        assert_eq!(Reference::parse("G-1"), None);
    }

    #[test]
    fn computes_group_table() {
        let (mut teams, games) = group();
        compute_tables(&mut teams, &games, TableRules { win: 3, draw: 1 });

        let germany = &teams[0];
        assert_eq!(germany.points, 6);
        assert_eq!(germany.goals_for, 7);
        assert_eq!(germany.goals_against, 1);
        assert_eq!(germany.place, 1);

        // Scotland and Hungary both have one point; Hungary's goal difference is better
        assert_eq!(teams[2].place, 2);
        assert_eq!(teams[1].place, 3);
        assert_eq!(teams[1].games_draw, 1);
        assert_eq!(teams[1].games_lost, 1);
    }

    #[test]
    fn previous_place_takes_the_old_place_every_run() {
        let (mut teams, games) = group();
        compute_tables(&mut teams, &games, TableRules { win: 3, draw: 1 });
        assert_eq!(teams[0].previous_place, 0);

        compute_tables(&mut teams, &games, TableRules { win: 3, draw: 1 });
        assert_eq!(teams[0].previous_place, 1);
        assert_eq!(teams[1].previous_place, 3);
        assert_eq!(teams[1].place, 3);
    }

    #[test]
    fn bracket_places_resolve_only_when_complete() {
        let (mut teams, mut games) = group();
        games[2].ended = false;
        compute_tables(&mut teams, &games, TableRules { win: 3, draw: 1 });
        let resolver = ReferenceResolver::new(&games, &teams);
        assert_eq!(resolver.resolve_str("B-1-1"), None);

        games[2].ended = true;
        compute_tables(&mut teams, &games, TableRules { win: 3, draw: 1 });
        let resolver = ReferenceResolver::new(&games, &teams);
        assert_eq!(resolver.resolve_str("B-1-1"), teams[0].id);
        assert_eq!(resolver.resolve_str("B-1-2"), teams[2].id);
    }

    #[test]
    fn fills_playoff_slots_from_references() {
        let (mut teams, mut games) = group();
        compute_tables(&mut teams, &games, TableRules { win: 3, draw: 1 });

        let mut final_game = test_game(4, None, None);
        final_game.playoff = true;
        final_game.updatable = true;
        final_game.bracket = None;
        final_game.home_reference = Some("B-1-1".to_string());
        final_game.away_reference = Some("G-1-L".to_string());
        games.push(final_game);

        assert_eq!(resolve_playoff_teams(&mut games, &teams), 2);
        assert_eq!(games[3].home_team, teams[0].id);
        assert_eq!(games[3].away_team, teams[1].id);
        assert_eq!(resolve_playoff_teams(&mut games, &teams), 0);
    }
}
