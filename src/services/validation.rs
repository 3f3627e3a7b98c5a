use crate::errors::{AppError, Result};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 30;
pub const SCORE_MAX: i32 = 99;

/// Something `@` something `.` lowercase letters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !local.is_empty() && !host.is_empty() && !tld.is_empty() && tld.chars().all(|c| c.is_ascii_lowercase())
}

pub fn is_valid_username(username: &str) -> bool {
    let length = username.chars().count();
    (USERNAME_MIN..=USERNAME_MAX).contains(&length)
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn is_valid_password(password: &str) -> bool {
    (PASSWORD_MIN..=PASSWORD_MAX).contains(&password.chars().count())
}

pub fn is_valid_score(score: i32) -> bool {
    (0..=SCORE_MAX).contains(&score)
}

pub fn check_username(username: &str) -> Result<()> {
    if is_valid_username(username) {
        Ok(())
    } else {
        Err(AppError::invalid_data(format!(
            "Username must be {}-{} characters of letters, digits, '-' or '_'",
            USERNAME_MIN, USERNAME_MAX
        )))
    }
}

pub fn check_email(email: &str) -> Result<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AppError::invalid_data(format!("Invalid e-mail address: {}", email)))
    }
}

pub fn check_password(password: &str) -> Result<()> {
    if is_valid_password(password) {
        Ok(())
    } else {
        Err(AppError::invalid_data(format!(
            "Password must be {}-{} characters",
            PASSWORD_MIN, PASSWORD_MAX
        )))
    }
}
