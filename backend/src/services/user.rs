//! Account service: registration, login, token refresh
//!
//! Argon2 work runs on the blocking pool through `PasswordService::*_async`.

use crate::auth::{JwtService, PasswordService, TokenKind};
use crate::error::ApiError;
use crate::repositories::UserRepository;
use nutrition_tracker_shared::types::{AuthTokens, UserAccount};
use nutrition_tracker_shared::validation::validate_password;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::ValidateEmail;

pub struct UserService;

/// Emails are compared case-insensitively
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn issue_tokens(jwt: &JwtService, user_id: Uuid) -> Result<AuthTokens, ApiError> {
    Ok(AuthTokens {
        access_token: jwt.generate_access_token(user_id).map_err(ApiError::Internal)?,
        refresh_token: jwt.generate_refresh_token(user_id).map_err(ApiError::Internal)?,
        token_type: "Bearer".to_string(),
        expires_in: jwt.access_token_expiry_secs(),
    })
}

impl UserService {
    pub async fn register(
        pool: &PgPool,
        jwt: &JwtService,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, ApiError> {
        let email = normalize_email(email);
        if !email.validate_email() {
            return Err(ApiError::InvalidField {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            });
        }
        validate_password(password).map_err(|message| ApiError::InvalidField {
            field: "password".to_string(),
            message,
        })?;

        if UserRepository::email_taken(pool, &email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let password_hash = PasswordService::hash_async(password.to_string())
            .await
            .map_err(ApiError::Internal)?;

        let user = UserRepository::create(pool, &email, &password_hash)
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = %user.id, "User registered");
        metrics::counter!("users_registered_total").increment(1);

        issue_tokens(jwt, user.id)
    }

    pub async fn login(
        pool: &PgPool,
        jwt: &JwtService,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, ApiError> {
        let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

        let user = UserRepository::find_by_email(pool, &normalize_email(email))
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(invalid)?;

        let valid = PasswordService::verify_async(password.to_string(), user.password_hash.clone())
            .await
            .map_err(ApiError::Internal)?;
        if !valid {
            return Err(invalid());
        }

        issue_tokens(jwt, user.id)
    }

    /// Trade a refresh token for a fresh pair
    pub async fn refresh(
        pool: &PgPool,
        jwt: &JwtService,
        refresh_token: &str,
    ) -> Result<AuthTokens, ApiError> {
        let user_id = jwt
            .validate(refresh_token, TokenKind::Refresh)
            .and_then(|claims| claims.user_id())
            .map_err(|e| ApiError::Unauthorized(format!("Invalid refresh token: {}", e)))?;

        UserRepository::find_by_id(pool, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        issue_tokens(jwt, user_id)
    }

    pub async fn me(pool: &PgPool, user_id: Uuid) -> Result<UserAccount, ApiError> {
        let user = UserRepository::find_by_id(pool, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        Ok(UserAccount {
            id: user.id.to_string(),
            email: user.email,
            created_at: user.created_at,
        })
    }
}
