use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::user::{AuthResponse, Claims, ProfileResponse, User};

pub fn hash_password(password: &str) -> Result<String> {
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    Ok(verify(password, password_hash)?)
}

pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String> {
    let id = user.id.ok_or(AppError::DocumentNotFound)?;
    let claims = Claims {
        sub: id.to_hex(),
        username: user.username.clone(),
        admin: user.admin,
        exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

/// Profile plus a fresh token carrying the user's current name.
pub fn session(user: &User, config: &AppConfig) -> Result<AuthResponse> {
    Ok(AuthResponse {
        user: ProfileResponse::from(user),
        token: issue_token(user, &config.jwt_secret, config.jwt_ttl_hours)?,
    })
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(token_data.claims)
}

pub fn gravatar_url(email: &str) -> String {
    let digest = md5::compute(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{:x}?d=mm", digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_identity() {
        let mut user = User::new_tipper("anna", "anna@example.com", String::new(), String::new());
        user.admin = true;

        let token = issue_token(&user, "secret", 1).unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user.id_hex());
        assert!(claims.admin);

        assert!(matches!(decode_token(&token, "other"), Err(AppError::AuthError)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let user = User::new_tipper("anna", "anna@example.com", String::new(), String::new());
        let token = issue_token(&user, "secret", -2).unwrap();
        assert!(matches!(decode_token(&token, "secret"), Err(AppError::AuthError)));
    }

    #[test]
    fn session_after_rename_carries_the_new_name() {
        let config = AppConfig::for_tests();
        let mut user = User::new_tipper("anna", "anna@example.com", String::new(), String::new());
        let before = decode_token(&session(&user, &config).unwrap().token, &config.jwt_secret).unwrap();

        user.username = "annabel".to_string();
        let renamed = session(&user, &config).unwrap();
        let claims = decode_token(&renamed.token, &config.jwt_secret).unwrap();

        assert_eq!(claims.username, "annabel");
        assert_eq!(claims.sub, before.sub);
        assert_eq!(before.username, "anna");
        assert_eq!(renamed.user.user.username, "annabel");
    }

    #[test]
    fn gravatar_hashes_normalized_email() {
        assert_eq!(
            gravatar_url(" Anna@Example.com "),
            "https://www.gravatar.com/avatar/6b56db1f84a3997b902509d3fbf0a306?d=mm"
        );
    }

    #[test]
    fn verifies_hashed_password() {
        let hashed = hash("secret1", 4).unwrap();
        assert!(verify_password("secret1", &hashed).unwrap());
        assert!(!verify_password("secret2", &hashed).unwrap());
    }
}
