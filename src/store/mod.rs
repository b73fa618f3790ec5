//! Persistence boundary.
//!
//! Services only ever talk to the traits defined here. Two backends exist:
//! [`postgres`] for production and [`memory`] for tests and local demos.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::filters::{Page, ValidatedFilters};
use crate::models::{Folder, NewTask, Task, TaskChanges, TaskStatus, TokenScope, User};

/// Storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no matching record found")]
    NotFound,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("storage operation exceeded its deadline")]
    Timeout,

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("users_email_key") => {
                StoreError::DuplicateEmail
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `email` must already be normalized.
    async fn insert(&self, email: &str, password_hash: &str) -> StoreResult<User>;
    async fn get(&self, id: i64) -> StoreResult<User>;
    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(
        &self,
        hash: &[u8],
        user_id: i64,
        expiry: DateTime<Utc>,
        scope: TokenScope,
    ) -> StoreResult<()>;

    /// Owner of a non-expired token with this hash and scope.
    async fn user_id_for_hash(&self, scope: TokenScope, hash: &[u8]) -> StoreResult<Option<i64>>;

    /// Returns the number of rows removed.
    async fn delete_by_hash(&self, hash: &[u8]) -> StoreResult<u64>;

    async fn delete_for_user(&self, scope: TokenScope, user_id: i64) -> StoreResult<u64>;
}

#[async_trait]
pub trait FolderStore: Send + Sync {
    async fn insert(&self, user_id: i64, name: &str) -> StoreResult<Folder>;
    async fn get(&self, id: i64) -> StoreResult<Folder>;
    async fn list_by_user(&self, user_id: i64, filters: &ValidatedFilters) -> StoreResult<Page<Folder>>;
    async fn update(&self, id: i64, name: Option<&str>) -> StoreResult<Folder>;
    async fn delete(&self, id: i64) -> StoreResult<()>;
}

/// Optional narrowing applied to task listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    /// Only used by user-wide listings; empty means every folder.
    pub folder_ids: Vec<i64>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let day = task.datetime.date_naive();
        self.status.map_or(true, |s| task.status == s)
            && (self.folder_ids.is_empty() || self.folder_ids.contains(&task.folder_id))
            && self.min_date.map_or(true, |d| day >= d)
            && self.max_date.map_or(true, |d| day <= d)
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, folder_id: i64, task: &NewTask) -> StoreResult<Task>;
    async fn get(&self, id: i64) -> StoreResult<Task>;
    async fn list_by_folder(
        &self,
        folder_id: i64,
        filter: &TaskFilter,
        filters: &ValidatedFilters,
    ) -> StoreResult<Page<Task>>;
    async fn list_by_user(
        &self,
        user_id: i64,
        filter: &TaskFilter,
        filters: &ValidatedFilters,
    ) -> StoreResult<Page<Task>>;
    async fn update(&self, id: i64, changes: &TaskChanges) -> StoreResult<Task>;
    async fn delete(&self, id: i64) -> StoreResult<()>;
}

/// Every store the application needs, behind shared trait objects.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub folders: Arc<dyn FolderStore>,
    pub tasks: Arc<dyn TaskStore>,
}

impl Stores {
    pub fn postgres(pool: sqlx::PgPool, timeout: std::time::Duration) -> Self {
        let db = postgres::Db::new(pool, timeout);
        Self {
            users: Arc::new(postgres::PgUserStore::new(db.clone())),
            tokens: Arc::new(postgres::PgTokenStore::new(db.clone())),
            folders: Arc::new(postgres::PgFolderStore::new(db.clone())),
            tasks: Arc::new(postgres::PgTaskStore::new(db)),
        }
    }

    pub fn in_memory() -> Self {
        let backend = Arc::new(memory::MemoryStore::seeded());
        Self {
            users: backend.clone(),
            tokens: backend.clone(),
            folders: backend.clone(),
            tasks: backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(status: TaskStatus, folder_id: i64, day: u32) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
        Task {
            id: 1,
            title: "t".into(),
            description: String::new(),
            datetime: at,
            status,
            folder_id,
            created: at,
            updated: at,
        }
    }

    #[test]
    fn test_task_filter_matching() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Important),
            folder_ids: vec![2],
            min_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            max_date: NaiveDate::from_ymd_opt(2024, 3, 10),
        };
        assert!(filter.matches(&task(TaskStatus::Important, 2, 5)));
        assert!(filter.matches(&task(TaskStatus::Important, 2, 10)));
        assert!(!filter.matches(&task(TaskStatus::Default, 2, 6)));
        assert!(!filter.matches(&task(TaskStatus::Important, 3, 6)));
        assert!(!filter.matches(&task(TaskStatus::Important, 2, 11)));
        assert!(TaskFilter::default().matches(&task(TaskStatus::Cancelled, 9, 1)));
    }
}
