pub(crate) mod admin;
pub(crate) mod application;
pub(crate) mod auth;
pub(crate) mod system;
pub(crate) mod tips;
pub(crate) mod tournament;
pub(crate) mod users;
