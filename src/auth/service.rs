//! Login, refresh, logout and guest sessions.

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::password::verify_password_blocking;
use super::refresh::RefreshTokenManager;
use super::token::AccessTokenSigner;
use super::{AuthResponse, LoginRequest};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{RefreshToken, TokenScope};
use crate::store::UserStore;

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 5;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;
pub const GUEST_TOKEN_TTL_HOURS: i64 = 24;
pub const GUEST_EMAIL: &str = "guest@example.com";

/// Well-formed cost 12 hash checked when no account matches, so unknown
/// emails pay the same bcrypt price as wrong passwords.
const UNKNOWN_USER_HASH: &str = "$2y$12$L6Bc/AlTQHyd9liGgGEZyOFLPHNgyxeEPfgYfBCVxJ7JIlwxyVU3u";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    refresh_tokens: RefreshTokenManager,
    signer: AccessTokenSigner,
    guest_login_enabled: bool,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: RefreshTokenManager,
        signer: AccessTokenSigner,
        guest_login_enabled: bool,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            signer,
            guest_login_enabled,
        }
    }

    pub fn signer(&self) -> &AccessTokenSigner {
        &self.signer
    }

    /// Checks credentials and opens a session.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, credentials: LoginRequest) -> Result<(AuthResponse, RefreshToken), AppError> {
        let email = normalize_email(&credentials.email);
        let user = self.users.get_by_email(&email).await?;
        let hash = user
            .as_ref()
            .map_or_else(|| UNKNOWN_USER_HASH.to_string(), |user| user.password_hash.clone());

        let matches = verify_password_blocking(credentials.password, hash).await?;
        let user = match user {
            Some(user) if matches => user,
            _ => return Err(AppError::Unauthorized("invalid credentials".into())),
        };

        let now = Utc::now();
        let access_token = self
            .signer
            .sign(user.id, now + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES))?;
        let refresh = self
            .refresh_tokens
            .issue(
                user.id,
                now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
                TokenScope::Refresh,
            )
            .await?;

        log::info!("user {} logged in", user.id);
        Ok((AuthResponse { access_token, user }, refresh))
    }

    /// Mints a new access token from a live refresh token. The refresh token is not rotated.
    pub async fn refresh(&self, plaintext: &str) -> Result<AuthResponse, AppError> {
        let user_id = self
            .refresh_tokens
            .user_for_token(TokenScope::Refresh, plaintext)
            .await?
            .ok_or_else(|| {
                log::warn!("rejected unknown or expired refresh token");
                AppError::Unauthorized("invalid refresh token".into())
            })?;

        let user = self.users.get(user_id).await?;
        let access_token = self
            .signer
            .sign(user.id, Utc::now() + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES))?;
        Ok(AuthResponse { access_token, user })
    }

    pub async fn logout(&self, plaintext: &str) -> Result<(), AppError> {
        self.refresh_tokens.revoke(plaintext).await
    }

    pub async fn logout_everywhere(&self, user_id: i64) -> Result<(), AppError> {
        self.refresh_tokens
            .revoke_all(TokenScope::Refresh, user_id)
            .await
    }

    /// Long-lived access token for the shared guest account, when enabled.
    pub async fn guest_login(&self) -> Result<AuthResponse, AppError> {
        if !self.guest_login_enabled {
            return Err(AppError::NotFound("guest login is disabled".into()));
        }

        let user = self
            .users
            .get_by_email(GUEST_EMAIL)
            .await?
            .ok_or_else(|| AppError::Unauthorized("guest account is missing".into()))?;
        let access_token = self
            .signer
            .sign(user.id, Utc::now() + Duration::hours(GUEST_TOKEN_TTL_HOURS))?;

        log::info!("guest session opened for user {}", user.id);
        Ok(AuthResponse { access_token, user })
    }
}
