use serde::{Deserialize, Serialize};

use crate::models::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub home: i32,
    pub away: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Home,
    Draw,
    Away,
}

impl Score {
    pub fn new(home: i32, away: i32) -> Self {
        Score { home, away }
    }

    pub fn difference(&self) -> i32 {
        self.home - self.away
    }

    pub fn trend(&self) -> Trend {
        match self.home.cmp(&self.away) {
            std::cmp::Ordering::Greater => Trend::Home,
            std::cmp::Ordering::Equal => Trend::Draw,
            std::cmp::Ordering::Less => Trend::Away,
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.home, self.away)
    }
}

/// Points awarded per tip category, taken from the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointRules {
    pub exact: i32,
    pub difference: i32,
    pub trend: i32,
}

impl From<&Settings> for PointRules {
    fn from(settings: &Settings) -> Self {
        PointRules {
            exact: settings.points_tip,
            difference: settings.points_tip_diff,
            trend: settings.points_tip_trend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipOutcome {
    Exact,
    Difference,
    Trend,
    Miss,
}

impl TipOutcome {
    pub fn evaluate(result: Score, tip: Score) -> Self {
        if result == tip {
            TipOutcome::Exact
        } else if result.difference() == tip.difference() {
            TipOutcome::Difference
        } else if result.trend() == tip.trend() {
            TipOutcome::Trend
        } else {
            TipOutcome::Miss
        }
    }

    pub fn points(&self, rules: &PointRules) -> i32 {
        match self {
            TipOutcome::Exact => rules.exact,
            TipOutcome::Difference => rules.difference,
            TipOutcome::Trend => rules.trend,
            TipOutcome::Miss => 0,
        }
    }
}

pub fn tip_points(rules: &PointRules, result: Score, tip: Score) -> i32 {
    TipOutcome::evaluate(result, tip).points(rules)
}

/// Running totals for one user over all scored tips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub tip_points: i32,
    pub extra_points: i32,
    pub correct_results: i32,
    pub correct_differences: i32,
    pub correct_trends: i32,
    pub correct_extra_tips: i32,
}

impl Tally {
    pub fn add_game_tip(&mut self, outcome: TipOutcome, rules: &PointRules) {
        self.tip_points += outcome.points(rules);
        match outcome {
            TipOutcome::Exact => self.correct_results += 1,
            TipOutcome::Difference => self.correct_differences += 1,
            TipOutcome::Trend => self.correct_trends += 1,
            TipOutcome::Miss => {}
        }
    }

    pub fn add_extra_tip(&mut self, points: i32) {
        if points > 0 {
            self.extra_points += points;
            self.correct_extra_tips += 1;
        }
    }

    pub fn points(&self) -> i32 {
        self.tip_points + self.extra_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> PointRules {
        PointRules::from(&Settings::default())
    }

    #[test]
    fn exact_result_earns_full_points() {
        assert_eq!(tip_points(&rules(), Score::new(2, 1), Score::new(2, 1)), 4);
        assert_eq!(tip_points(&rules(), Score::new(0, 0), Score::new(0, 0)), 4);
    }

    #[test]
    fn goal_difference_beats_trend() {
        assert_eq!(tip_points(&rules(), Score::new(3, 1), Score::new(2, 0)), 2);
        // a draw tipped with the wrong goals still has the right difference
        assert_eq!(tip_points(&rules(), Score::new(1, 1), Score::new(2, 2)), 2);
    }

    #[test]
    fn trend_only() {
        assert_eq!(tip_points(&rules(), Score::new(3, 0), Score::new(1, 0)), 1);
        assert_eq!(tip_points(&rules(), Score::new(0, 2), Score::new(1, 4)), 1);
    }

    #[test]
    fn wrong_trend_earns_nothing() {
        assert_eq!(tip_points(&rules(), Score::new(1, 0), Score::new(0, 1)), 0);
        assert_eq!(tip_points(&rules(), Score::new(1, 1), Score::new(2, 1)), 0);
    }

    #[test]
    fn custom_rules_are_applied() {
        let rules = PointRules {
            exact: 5,
            difference: 3,
            trend: 2,
        };
        assert_eq!(tip_points(&rules, Score::new(1, 0), Score::new(1, 0)), 5);
        assert_eq!(tip_points(&rules, Score::new(2, 1), Score::new(1, 0)), 3);
        assert_eq!(tip_points(&rules, Score::new(2, 0), Score::new(1, 0)), 2);
    }

    #[test]
    fn tally_counts_categories() {
        let rules = rules();
        let mut tally = Tally::default();
        tally.add_game_tip(TipOutcome::Exact, &rules);
        tally.add_game_tip(TipOutcome::Trend, &rules);
        tally.add_game_tip(TipOutcome::Miss, &rules);
        tally.add_extra_tip(10);
        tally.add_extra_tip(0);

        assert_eq!(tally.tip_points, 5);
        assert_eq!(tally.extra_points, 10);
        assert_eq!(tally.points(), 15);
        assert_eq!(tally.correct_results, 1);
        assert_eq!(tally.correct_trends, 1);
        assert_eq!(tally.correct_differences, 0);
        assert_eq!(tally.correct_extra_tips, 1);
    }
}
