use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid e-mail address"))]
    pub email: String,

    #[validate(must_match(other = "email", message = "E-mail addresses do not match"))]
    pub email_confirmation: String,

    #[validate(length(min = 6, max = 30, message = "Password must be 6-30 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid e-mail address"))]
    pub email: String,

    #[validate(length(min = 6, max = 30, message = "Password must be 6-30 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUsernameRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmailRequest {
    #[validate(email(message = "Invalid e-mail address"))]
    pub email: String,

    #[validate(must_match(other = "email", message = "E-mail addresses do not match"))]
    pub email_confirmation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 6, max = 30, message = "Password must be 6-30 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotificationsRequest {
    pub reminder: bool,
    pub notification: bool,
    pub send_standings: bool,
    pub send_game_tips: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        MessageResponse {
            success: true,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_requires_matching_confirmations() {
        let request = RegisterRequest {
            username: "anna".to_string(),
            email: "anna@example.com".to_string(),
            email_confirmation: "anna@example.com".to_string(),
            password: "secret1".to_string(),
            password_confirmation: "secret1".to_string(),
        };
        assert!(request.validate().is_ok());

        let mismatch = RegisterRequest {
            password_confirmation: "secret2".to_string(),
            ..request
        };
        let errors = mismatch.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password_confirmation"));
    }

    #[test]
    fn short_password_is_rejected() {
        let request = UpdatePasswordRequest {
            password: "abc".to_string(),
            password_confirmation: "abc".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
