pub mod extractors;
pub mod middleware;
pub mod password;
pub mod refresh;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};

use crate::models::User;

pub use extractors::AuthenticatedUser;
pub use middleware::RequireAuth;
pub use password::{hash_password, verify_password};
pub use refresh::RefreshTokenManager;
pub use service::AuthService;
pub use token::{AccessTokenSigner, Claims};

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Represents the payload for a user login request.
///
/// Not validated beyond decoding: any malformed credential simply fails to
/// authenticate.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// Keeps the password out of logs.
impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body returned by login, refresh and guest login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Short-lived bearer token.
    pub access_token: String,
    pub user: User,
}
