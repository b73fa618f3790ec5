//! PostgreSQL backend built on `sqlx`.
//!
//! Every statement goes through [`Db::run`], which bounds it by the configured
//! per-operation deadline. An elapsed deadline drops the query future and is
//! reported as [`StoreError::Timeout`]; nothing is retried here.

mod folders;
mod tasks;
mod tokens;
mod users;

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use super::{StoreError, StoreResult};
use crate::filters::Page;

pub use folders::PgFolderStore;
pub use tasks::PgTaskStore;
pub use tokens::PgTokenStore;
pub use users::PgUserStore;

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
    timeout: Duration,
}

impl Db {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                log::error!("database operation timed out after {:?}", self.timeout);
                Err(StoreError::Timeout)
            }
        }
    }
}

/// Collects rows produced by a `count(*) OVER() AS total, ...` query.
fn counted<T>(rows: Vec<PgRow>) -> StoreResult<Page<T>>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    let mut total_records = 0;
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        total_records = row.try_get::<i64, _>("total")?;
        items.push(T::from_row(&row)?);
    }
    Ok(Page {
        items,
        total_records,
    })
}
