pub mod admin;
pub mod application;
pub mod auth;
pub mod system;
pub mod tips;
pub mod tournament;
pub mod users;
