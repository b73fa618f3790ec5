use async_trait::async_trait;

use super::{counted, Db};
use crate::filters::{Page, ValidatedFilters};
use crate::models::{NewTask, Task, TaskChanges};
use crate::store::{StoreError, StoreResult, TaskFilter, TaskStore};

const COLUMNS: &str = "tasks.id, tasks.title, tasks.description, tasks.datetime, tasks.status, \
                       tasks.folder_id, tasks.created, tasks.updated";

pub struct PgTaskStore {
    db: Db,
}

impl PgTaskStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, folder_id: i64, task: &NewTask) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (title, description, datetime, status, folder_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            COLUMNS
        );
        self.db
            .run(
                sqlx::query_as::<_, Task>(&sql)
                    .bind(&task.title)
                    .bind(&task.description)
                    .bind(task.datetime)
                    .bind(task.status)
                    .bind(folder_id)
                    .fetch_one(self.db.pool()),
            )
            .await
    }

    async fn get(&self, id: i64) -> StoreResult<Task> {
        let sql = format!("SELECT {} FROM tasks WHERE tasks.id = $1", COLUMNS);
        self.db
            .run(
                sqlx::query_as::<_, Task>(&sql)
                    .bind(id)
                    .fetch_one(self.db.pool()),
            )
            .await
    }

    async fn list_by_folder(
        &self,
        folder_id: i64,
        filter: &TaskFilter,
        filters: &ValidatedFilters,
    ) -> StoreResult<Page<Task>> {
        let sql = format!(
            "SELECT count(*) OVER() AS total, {}
             FROM tasks
             WHERE tasks.folder_id = $1
             AND ($2::task_status IS NULL OR tasks.status = $2)
             AND ($3::date IS NULL OR (tasks.datetime AT TIME ZONE 'UTC')::date >= $3)
             AND ($4::date IS NULL OR (tasks.datetime AT TIME ZONE 'UTC')::date <= $4)
             ORDER BY tasks.{} {}, tasks.id ASC
             LIMIT $5 OFFSET $6",
            COLUMNS,
            filters.sort_column(),
            filters.sort_direction().as_sql()
        );
        let rows = self
            .db
            .run(
                sqlx::query(&sql)
                    .bind(folder_id)
                    .bind(filter.status)
                    .bind(filter.min_date)
                    .bind(filter.max_date)
                    .bind(filters.limit())
                    .bind(filters.offset())
                    .fetch_all(self.db.pool()),
            )
            .await?;
        counted(rows)
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        filter: &TaskFilter,
        filters: &ValidatedFilters,
    ) -> StoreResult<Page<Task>> {
        let sql = format!(
            "SELECT count(*) OVER() AS total, {}
             FROM tasks
             INNER JOIN folders ON folders.id = tasks.folder_id
             WHERE folders.user_id = $1
             AND ($2::task_status IS NULL OR tasks.status = $2)
             AND (cardinality($3::bigint[]) = 0 OR tasks.folder_id = ANY($3))
             AND ($4::date IS NULL OR (tasks.datetime AT TIME ZONE 'UTC')::date >= $4)
             AND ($5::date IS NULL OR (tasks.datetime AT TIME ZONE 'UTC')::date <= $5)
             ORDER BY tasks.{} {}, tasks.id ASC
             LIMIT $6 OFFSET $7",
            COLUMNS,
            filters.sort_column(),
            filters.sort_direction().as_sql()
        );
        let rows = self
            .db
            .run(
                sqlx::query(&sql)
                    .bind(user_id)
                    .bind(filter.status)
                    .bind(filter.folder_ids.clone())
                    .bind(filter.min_date)
                    .bind(filter.max_date)
                    .bind(filters.limit())
                    .bind(filters.offset())
                    .fetch_all(self.db.pool()),
            )
            .await?;
        counted(rows)
    }

    async fn update(&self, id: i64, changes: &TaskChanges) -> StoreResult<Task> {
        let sql = format!(
            "UPDATE tasks
             SET title = COALESCE($1, title),
                 description = COALESCE($2, description),
                 status = COALESCE($3, status),
                 datetime = COALESCE($4, datetime),
                 folder_id = COALESCE($5, folder_id),
                 updated = now()
             WHERE tasks.id = $6
             RETURNING {}",
            COLUMNS
        );
        self.db
            .run(
                sqlx::query_as::<_, Task>(&sql)
                    .bind(changes.title.as_deref())
                    .bind(changes.description.as_deref())
                    .bind(changes.status)
                    .bind(changes.datetime)
                    .bind(changes.folder_id)
                    .bind(id)
                    .fetch_one(self.db.pool()),
            )
            .await
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = self
            .db
            .run(
                sqlx::query("DELETE FROM tasks WHERE id = $1")
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
