use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Db;
use crate::models::TokenScope;
use crate::store::{StoreResult, TokenStore};

pub struct PgTokenStore {
    db: Db,
}

impl PgTokenStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert(
        &self,
        hash: &[u8],
        user_id: i64,
        expiry: DateTime<Utc>,
        scope: TokenScope,
    ) -> StoreResult<()> {
        self.db
            .run(
                sqlx::query(
                    "INSERT INTO tokens (hash, user_id, expiry, scope) VALUES ($1, $2, $3, $4)",
                )
                .bind(hash)
                .bind(user_id)
                .bind(expiry)
                .bind(scope.as_str())
                .execute(self.db.pool()),
            )
            .await
            .map(|_| ())
    }

    async fn user_id_for_hash(&self, scope: TokenScope, hash: &[u8]) -> StoreResult<Option<i64>> {
        self.db
            .run(
                sqlx::query_scalar::<_, i64>(
                    "SELECT user_id FROM tokens
                     WHERE hash = $1 AND scope = $2 AND expiry > now()",
                )
                .bind(hash)
                .bind(scope.as_str())
                .fetch_optional(self.db.pool()),
            )
            .await
    }

    async fn delete_by_hash(&self, hash: &[u8]) -> StoreResult<u64> {
        self.db
            .run(
                sqlx::query("DELETE FROM tokens WHERE hash = $1")
                    .bind(hash)
                    .execute(self.db.pool()),
            )
            .await
            .map(|result| result.rows_affected())
    }

    async fn delete_for_user(&self, scope: TokenScope, user_id: i64) -> StoreResult<u64> {
        self.db
            .run(
                sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
                    .bind(scope.as_str())
                    .bind(user_id)
                    .execute(self.db.pool()),
            )
            .await
            .map(|result| result.rows_affected())
    }
}
