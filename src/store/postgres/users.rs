use async_trait::async_trait;

use super::Db;
use crate::models::User;
use crate::store::{StoreResult, UserStore};

pub struct PgUserStore {
    db: Db,
}

impl PgUserStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        self.db
            .run(
                sqlx::query_as::<_, User>(
                    "INSERT INTO users (email, password_hash, created)
                     VALUES ($1, $2, now())
                     RETURNING id, email, password_hash, created",
                )
                .bind(email)
                .bind(password_hash)
                .fetch_one(self.db.pool()),
            )
            .await
    }

    async fn get(&self, id: i64) -> StoreResult<User> {
        self.db
            .run(
                sqlx::query_as::<_, User>(
                    "SELECT id, email, password_hash, created FROM users WHERE id = $1",
                )
                .bind(id)
                .fetch_one(self.db.pool()),
            )
            .await
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.db
            .run(
                sqlx::query_as::<_, User>(
                    "SELECT id, email, password_hash, created FROM users WHERE email = $1",
                )
                .bind(email)
                .fetch_optional(self.db.pool()),
            )
            .await
    }
}
