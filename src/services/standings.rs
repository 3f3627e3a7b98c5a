use std::cmp::{Ordering, Reverse};

use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceTrend {
    Up,
    Down,
    Same,
    New,
}

impl PlaceTrend {
    pub fn of(user: &User) -> Self {
        if user.previous_place <= 0 {
            return PlaceTrend::New;
        }
        match user.place.cmp(&user.previous_place) {
            Ordering::Less => PlaceTrend::Up,
            Ordering::Greater => PlaceTrend::Down,
            Ordering::Equal => PlaceTrend::Same,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceTrend::Up => "up",
            PlaceTrend::Down => "down",
            PlaceTrend::Same => "same",
            PlaceTrend::New => "new",
        }
    }
}

type RankKey = (Reverse<i32>, Reverse<i32>, Reverse<i32>, Reverse<i32>, Reverse<i32>);

fn rank_key(user: &User) -> RankKey {
    (
        Reverse(user.points),
        Reverse(user.correct_results),
        Reverse(user.correct_differences),
        Reverse(user.correct_trends),
        Reverse(user.correct_extra_tips),
    )
}

pub fn compare(a: &User, b: &User) -> Ordering {
    rank_key(a)
        .cmp(&rank_key(b))
        .then_with(|| a.username.cmp(&b.username))
}

/// Sorts users into standings order and assigns places.
///
/// Users with an identical ranking key share a place and the following
/// place is skipped (1, 1, 3). Every run moves the old place to
/// `previous_place` before the new one is written. Remaining ties are
/// broken by the byte order of the username, the order MongoDB sorts
/// `{ "username": 1 }` in.
pub fn rank(users: &mut [User]) {
    users.sort_by(compare);

    let mut place = 0;
    let mut last_key: Option<RankKey> = None;
    for (index, user) in users.iter_mut().enumerate() {
        let key = rank_key(user);
        if last_key != Some(key) {
            place = index as i32 + 1;
            last_key = Some(key);
        }

        user.previous_place = user.place;
        user.place = place;
    }
}

pub fn points_to_first_place(users: &[User], user: &User) -> i32 {
    let top = users.iter().map(|u| u.points).max().unwrap_or(0);
    (top - user.points).max(0)
}

pub fn top_three_message(users: &[User]) -> String {
    let ranked: Vec<String> = users
        .iter()
        .take(3)
        .map(|user| format!("{} ({} points)", user.username, user.points))
        .collect();

    format!("Top 3: {}", ranked.join(", "))
}
