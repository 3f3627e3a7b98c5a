pub mod auth_service;
pub mod brackets;
pub mod calculation;
pub mod calculation_service;
pub mod data_service;
pub mod import_service;
pub mod mail_service;
pub mod mailer;
pub mod openliga_service;
pub mod presentation;
pub mod scoring;
pub mod standings;
pub mod statistics;
pub mod tips;
pub mod validation;
