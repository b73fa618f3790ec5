use async_trait::async_trait;

use super::{counted, Db};
use crate::filters::{Page, ValidatedFilters};
use crate::models::Folder;
use crate::store::{FolderStore, StoreError, StoreResult};

const COLUMNS: &str = "id, name, user_id, created, updated";

pub struct PgFolderStore {
    db: Db,
}

impl PgFolderStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FolderStore for PgFolderStore {
    async fn insert(&self, user_id: i64, name: &str) -> StoreResult<Folder> {
        let sql = format!(
            "INSERT INTO folders (name, user_id) VALUES ($1, $2) RETURNING {}",
            COLUMNS
        );
        self.db
            .run(
                sqlx::query_as::<_, Folder>(&sql)
                    .bind(name)
                    .bind(user_id)
                    .fetch_one(self.db.pool()),
            )
            .await
    }

    async fn get(&self, id: i64) -> StoreResult<Folder> {
        let sql = format!("SELECT {} FROM folders WHERE id = $1", COLUMNS);
        self.db
            .run(
                sqlx::query_as::<_, Folder>(&sql)
                    .bind(id)
                    .fetch_one(self.db.pool()),
            )
            .await
    }

    async fn list_by_user(&self, user_id: i64, filters: &ValidatedFilters) -> StoreResult<Page<Folder>> {
        // The sort column is an allow-list entry, never raw input.
        let sql = format!(
            "SELECT count(*) OVER() AS total, {}
             FROM folders
             WHERE user_id = $1
             ORDER BY {} {}, id ASC
             LIMIT $2 OFFSET $3",
            COLUMNS,
            filters.sort_column(),
            filters.sort_direction().as_sql()
        );
        let rows = self
            .db
            .run(
                sqlx::query(&sql)
                    .bind(user_id)
                    .bind(filters.limit())
                    .bind(filters.offset())
                    .fetch_all(self.db.pool()),
            )
            .await?;
        counted(rows)
    }

    async fn update(&self, id: i64, name: Option<&str>) -> StoreResult<Folder> {
        let sql = format!(
            "UPDATE folders SET name = COALESCE($1, name), updated = now()
             WHERE id = $2
             RETURNING {}",
            COLUMNS
        );
        self.db
            .run(
                sqlx::query_as::<_, Folder>(&sql)
                    .bind(name)
                    .bind(id)
                    .fetch_one(self.db.pool()),
            )
            .await
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = self
            .db
            .run(
                sqlx::query("DELETE FROM folders WHERE id = $1")
                    .bind(id)
                    .execute(self.db.pool()),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
