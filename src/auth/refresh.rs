//! Opaque, server-tracked refresh tokens.
//!
//! The plaintext is 16 random bytes, base32 encoded without padding. Only its
//! SHA-256 digest is persisted, so a leaked token table cannot be replayed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::models::{RefreshToken, TokenScope};
use crate::store::TokenStore;

const TOKEN_BYTES: usize = 16;

/// SHA-256 digest used as the storage key for a plaintext token.
pub fn hash_token(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

fn generate_plaintext() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    BASE32_NOPAD.encode(&bytes)
}

#[derive(Clone)]
pub struct RefreshTokenManager {
    tokens: Arc<dyn TokenStore>,
}

impl RefreshTokenManager {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }

    pub async fn issue(
        &self,
        user_id: i64,
        expiry: DateTime<Utc>,
        scope: TokenScope,
    ) -> Result<RefreshToken, AppError> {
        let plaintext = generate_plaintext();
        let hash = hash_token(&plaintext);
        self.tokens.insert(&hash, user_id, expiry, scope).await?;

        Ok(RefreshToken {
            plaintext,
            hash,
            user_id,
            expiry,
            scope,
        })
    }

    /// Owner of a live token, or `None` when it is unknown, expired or of another scope.
    pub async fn user_for_token(&self, scope: TokenScope, plaintext: &str) -> Result<Option<i64>, AppError> {
        Ok(self
            .tokens
            .user_id_for_hash(scope, &hash_token(plaintext))
            .await?)
    }

    /// Deleting a token that does not exist is not an error.
    pub async fn revoke(&self, plaintext: &str) -> Result<(), AppError> {
        let removed = self.tokens.delete_by_hash(&hash_token(plaintext)).await?;
        log::debug!("revoked {} refresh token(s)", removed);
        Ok(())
    }

    pub async fn revoke_all(&self, scope: TokenScope, user_id: i64) -> Result<(), AppError> {
        let removed = self.tokens.delete_for_user(scope, user_id).await?;
        log::info!("revoked {} {} token(s) for user {}", removed, scope.as_str(), user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::Duration;

    fn manager() -> RefreshTokenManager {
        RefreshTokenManager::new(Arc::new(MemoryStore::default()))
    }

    #[test]
    fn test_plaintext_shape() {
        let token = generate_plaintext();
        assert_eq!(token.len(), 26);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
        assert_ne!(token, generate_plaintext());
        assert_eq!(hash_token(&token).len(), 32);
    }

    #[actix_rt::test]
    async fn test_issue_resolve_revoke() {
        let manager = manager();
        let token = manager
            .issue(5, Utc::now() + Duration::days(7), TokenScope::Refresh)
            .await
            .unwrap();
        assert_eq!(token.hash, hash_token(&token.plaintext));

        let owner = manager
            .user_for_token(TokenScope::Refresh, &token.plaintext)
            .await
            .unwrap();
        assert_eq!(owner, Some(5));

        manager.revoke(&token.plaintext).await.unwrap();
        manager.revoke(&token.plaintext).await.unwrap();
        let owner = manager
            .user_for_token(TokenScope::Refresh, &token.plaintext)
            .await
            .unwrap();
        assert_eq!(owner, None);
    }

    #[actix_rt::test]
    async fn test_expired_token_does_not_resolve() {
        let manager = manager();
        let token = manager
            .issue(5, Utc::now() - Duration::seconds(1), TokenScope::Refresh)
            .await
            .unwrap();
        let owner = manager
            .user_for_token(TokenScope::Refresh, &token.plaintext)
            .await
            .unwrap();
        assert_eq!(owner, None);
    }

    #[actix_rt::test]
    async fn test_revoke_all_only_touches_one_user() {
        let manager = manager();
        let expiry = Utc::now() + Duration::days(7);
        let a1 = manager.issue(1, expiry, TokenScope::Refresh).await.unwrap();
        let a2 = manager.issue(1, expiry, TokenScope::Refresh).await.unwrap();
        let b = manager.issue(2, expiry, TokenScope::Refresh).await.unwrap();

        manager.revoke_all(TokenScope::Refresh, 1).await.unwrap();

        for token in [&a1, &a2] {
            let owner = manager
                .user_for_token(TokenScope::Refresh, &token.plaintext)
                .await
                .unwrap();
            assert_eq!(owner, None);
        }
        let owner = manager
            .user_for_token(TokenScope::Refresh, &b.plaintext)
            .await
            .unwrap();
        assert_eq!(owner, Some(2));
    }
}
