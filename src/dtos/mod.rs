pub mod admin_dtos;
pub mod auth_dtos;
