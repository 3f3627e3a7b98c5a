pub mod bracket;
pub mod confirmation;
pub mod extra;
pub mod extra_tip;
pub mod game;
pub mod game_tip;
pub mod job;
pub mod playday;
pub mod settings;
pub mod team;
pub mod user;
