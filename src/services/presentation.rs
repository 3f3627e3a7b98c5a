//! Text helpers shared by the JSON views and the mails.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::models::{bracket::Bracket, game::Game, game_tip::GameTip};
use crate::services::brackets::Reference;
use crate::services::scoring::Trend;

const MINUTE: i64 = 60;
const HOUR: i64 = MINUTE * 60;
const DAY: i64 = HOUR * 24;
const MONTH: i64 = DAY * 30;
const YEAR: i64 = DAY * 365;

pub const ROWS_PER_PAGE: i64 = 10;
const PAGE_OFFSET: i64 = 5;

fn counted(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("in {} {}", count, unit)
    } else {
        format!("in {} {}s", count, unit)
    }
}

/// Time until `date` as "in N unit(s)", or "ended" once it has passed.
pub fn difference(now: DateTime<Utc>, date: DateTime<Utc>) -> String {
    if date <= now {
        return "ended".to_string();
    }

    let delta = (date - now).num_seconds();
    if delta < MINUTE {
        counted(delta, "second")
    } else if delta < HOUR {
        counted(delta / MINUTE, "minute")
    } else if delta < DAY {
        counted(delta / HOUR, "hour")
    } else if delta < MONTH {
        counted(delta / DAY, "day")
    } else if delta < YEAR {
        counted(delta / MONTH, "month")
    } else {
        counted(delta / YEAR, "year")
    }
}

pub fn result_text(game: &Game) -> String {
    if !game.ended {
        return "-".to_string();
    }
    match (game.overtime_result(), game.overtime_type) {
        (Some(score), Some(kind)) => format!("{} ({})", score, kind.as_str()),
        _ => game
            .regular_result()
            .map(|score| score.to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}

pub fn place_name(place: i32) -> &'static str {
    match place {
        1 => "First",
        2 => "Second",
        3 => "Third",
        4 => "Fourth",
        5 => "Fifth",
        6 => "Sixth",
        7 => "Seventh",
        8 => "Eighth",
        9 => "Ninth",
        10 => "Tenth",
        _ => "",
    }
}

/// Human name of an unresolved playoff slot.
pub fn reference_name(reference: &str, brackets: &[Bracket]) -> String {
    match Reference::parse(reference) {
        Some(Reference::WinnerOf(number)) => format!("Winner game {}", number),
        Some(Reference::LoserOf(number)) => format!("Loser game {}", number),
        Some(Reference::BracketPlace { bracket, place }) => {
            let name = brackets
                .iter()
                .find(|b| b.number == bracket)
                .map(|b| b.name.as_str())
                .unwrap_or_default();
            format!("{} {}", place_name(place), name).trim().to_string()
        }
        None => String::new(),
    }
}

pub type TeamNames = HashMap<ObjectId, String>;

pub fn side_name(team: Option<ObjectId>, reference: Option<&str>, teams: &TeamNames, brackets: &[Bracket]) -> String {
    team.and_then(|id| teams.get(&id).cloned())
        .or_else(|| reference.map(|r| reference_name(r, brackets)))
        .unwrap_or_else(|| "?".to_string())
}

/// "Home - Away", falling back to the reference names of undecided slots.
pub fn game_title(game: &Game, teams: &TeamNames, brackets: &[Bracket]) -> String {
    format!(
        "{} - {}",
        side_name(game.home_team, game.home_reference.as_deref(), teams, brackets),
        side_name(game.away_team, game.away_reference.as_deref(), teams, brackets)
    )
}

pub fn diff_to_top(points_diff: i32) -> String {
    match points_diff {
        d if d <= 0 => "You are in first place.".to_string(),
        1 => "You are 1 point behind first place.".to_string(),
        d => format!("You are {} points behind first place.", d),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub show_controls: bool,
    pub offset_start: i64,
    pub offset: i64,
    pub pages: i64,
    pub current_page: i64,
    pub from: i64,
    pub fetch: i64,
}

/// Page window for `rows` entries; `page` is clamped to the existing pages.
pub fn pagination(rows: i64, page: Option<i64>) -> Pagination {
    let rows = rows.max(0);
    let pages = rows.saturating_add(ROWS_PER_PAGE - 1) / ROWS_PER_PAGE;
    let current_page = page.unwrap_or(1).clamp(1, pages.max(1));
    let (offset_start, offset) = if current_page - 2 > 0 {
        (current_page - 2, current_page.saturating_add(2))
    } else {
        (1, PAGE_OFFSET)
    };

    Pagination {
        show_controls: rows > ROWS_PER_PAGE,
        offset_start,
        offset,
        pages,
        current_page,
        from: (current_page - 1).saturating_mul(ROWS_PER_PAGE),
        fetch: ROWS_PER_PAGE,
    }
}

/// Points per scored tip with two decimals, "0" without any points.
pub fn points_per_tip(points: i32, tips: usize) -> String {
    if points <= 0 || tips == 0 {
        return "0".to_string();
    }
    format!("{:.2}", points as f64 / tips as f64)
}

/// Share of exact results among scored tips, in percent.
pub fn tip_quote(correct_results: i32, tips: usize) -> i32 {
    if tips == 0 {
        return 0;
    }
    ((correct_results as f64 / tips as f64) * 100.0).round() as i32
}

pub fn tip_trend(tips: &[GameTip]) -> String {
    if tips.len() < 4 {
        return "not enough tips".to_string();
    }

    let (mut home, mut draw, mut away) = (0, 0, 0);
    for tip in tips {
        match tip.score().trend() {
            Trend::Home => home += 1,
            Trend::Draw => draw += 1,
            Trend::Away => away += 1,
        }
    }
    format!("{} / {} / {}", home, draw, away)
}

/// What a viewer may see of someone's tip on `game`.
///
/// Before kickoff only the owner sees the score, afterwards everyone does,
/// and once the game has ended the points are appended.
pub fn visible_tip(tip: &GameTip, game: &Game, own: bool, now: DateTime<Utc>) -> String {
    if game.ended {
        return match tip.points {
            Some(points) => format!("{} ({})", tip.score(), points),
            None => tip.score().to_string(),
        };
    }
    if own || now > game.kickoff.to_chrono() {
        tip.score().to_string()
    } else {
        "tipped".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::{test_game, OvertimeType};
    use chrono::Duration;
    use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

    fn tip(home: i32, away: i32) -> GameTip {
        GameTip {
            id: None,
            user_id: ObjectId::new(),
            game_id: ObjectId::new(),
            playday: 1,
            home_score: home,
            away_score: away,
            points: None,
            placed: BsonDateTime::now(),
        }
    }

    #[test]
    fn difference_picks_largest_unit() {
        let now = Utc::now();
        assert_eq!(difference(now, now - Duration::seconds(1)), "ended");
        assert_eq!(difference(now, now + Duration::seconds(1)), "in 1 second");
        assert_eq!(difference(now, now + Duration::seconds(42)), "in 42 seconds");
        assert_eq!(difference(now, now + Duration::minutes(5)), "in 5 minutes");
        assert_eq!(difference(now, now + Duration::hours(1)), "in 1 hour");
        assert_eq!(difference(now, now + Duration::days(3)), "in 3 days");
        assert_eq!(difference(now, now + Duration::days(65)), "in 2 months");
        assert_eq!(difference(now, now + Duration::days(800)), "in 2 years");
    }

    #[test]
    fn result_text_prefers_overtime() {
        let mut game = test_game(1, None, None);
        assert_eq!(result_text(&game), "-");

        game.ended = true;
        game.home_score = Some(1);
        game.away_score = Some(1);
        assert_eq!(result_text(&game), "1 : 1");

        game.home_score_ot = Some(3);
        game.away_score_ot = Some(2);
        game.overtime_type = Some(OvertimeType::Penalty);
        assert_eq!(result_text(&game), "3 : 2 (penalty)");
    }

    #[test]
    fn names_references() {
        let brackets = vec![Bracket {
            id: None,
            number: 2,
            name: "Group B".to_string(),
            updatable: true,
        }];
        assert_eq!(reference_name("G-50-W", &brackets), "Winner game 50");
        assert_eq!(reference_name("G-50-L", &brackets), "Loser game 50");
        assert_eq!(reference_name("B-2-1", &brackets), "First Group B");
        assert_eq!(reference_name("nonsense", &brackets), "");
    }

    #[test]
    fn game_title_uses_references_for_open_slots() {
        let spain = ObjectId::new();
        let teams: TeamNames = [(spain, "Spain".to_string())].into_iter().collect();
        let mut game = test_game(50, Some(spain), None);
        game.away_reference = Some("G-49-W".to_string());
        assert_eq!(game_title(&game, &teams, &[]), "Spain - Winner game 49");
    }

    #[test]
    fn paginates_with_window() {
        let first = pagination(25, None);
        assert!(first.show_controls);
        assert_eq!((first.offset_start, first.offset), (1, 5));
        assert_eq!(first.pages, 3);
        assert_eq!(first.from, 0);

        let fourth = pagination(45, Some(4));
        assert_eq!((fourth.offset_start, fourth.offset), (2, 6));
        assert_eq!(fourth.from, 30);
        assert!(!pagination(10, Some(1)).show_controls);
    }

    #[test]
    fn page_out_of_range_is_clamped() {
        let huge = pagination(25, Some(i64::MAX));
        assert_eq!(huge.current_page, 3);
        assert_eq!(huge.from, 20);

        let negative = pagination(25, Some(-4));
        assert_eq!(negative.current_page, 1);
        assert_eq!(negative.from, 0);

        let empty = pagination(0, Some(7));
        assert_eq!((empty.pages, empty.current_page, empty.from), (0, 1, 0));
    }

    #[test]
    fn tip_statistics_text() {
        assert_eq!(points_per_tip(0, 4), "0");
        assert_eq!(points_per_tip(10, 4), "2.50");
        assert_eq!(tip_quote(1, 4), 25);
        assert_eq!(tip_quote(0, 0), 0);
        assert_eq!(diff_to_top(0), "You are in first place.");
        assert_eq!(diff_to_top(3), "You are 3 points behind first place.");
    }

    #[test]
    fn trend_needs_four_tips() {
        assert_eq!(tip_trend(&[tip(1, 0), tip(0, 0), tip(0, 1)]), "not enough tips");
        assert_eq!(
            tip_trend(&[tip(1, 0), tip(2, 0), tip(0, 0), tip(0, 1)]),
            "2 / 1 / 1"
        );
    }

    #[test]
    fn foreign_tips_hidden_until_kickoff() {
        let now = Utc::now();
        let mut game = test_game(1, None, None);
        game.kickoff = BsonDateTime::from_chrono(now + Duration::hours(2));
        let mut tip = tip(2, 1);

        assert_eq!(visible_tip(&tip, &game, false, now), "tipped");
        assert_eq!(visible_tip(&tip, &game, true, now), "2 : 1");
        assert_eq!(visible_tip(&tip, &game, false, now + Duration::hours(3)), "2 : 1");

        game.ended = true;
        tip.points = Some(4);
        assert_eq!(visible_tip(&tip, &game, false, now), "2 : 1 (4)");
    }
}
