//! In-process backend.
//!
//! Implements every store trait over plain collections behind one lock so the
//! full application can run without PostgreSQL. Sorting, paging and filtering
//! mirror the SQL backend.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{FolderStore, StoreError, StoreResult, TaskFilter, TaskStore, TokenStore, UserStore};
use crate::auth::service::GUEST_EMAIL;
use crate::filters::{Page, SortDirection, ValidatedFilters};
use crate::models::{Folder, NewTask, Task, TaskChanges, TokenScope, User};

#[derive(Debug, Clone)]
struct TokenRow {
    user_id: i64,
    expiry: DateTime<Utc>,
    scope: TokenScope,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    tokens: BTreeMap<Vec<u8>, TokenRow>,
    folders: BTreeMap<i64, Folder>,
    tasks: BTreeMap<i64, Task>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Starts with the same guest account the initial migration inserts.
    pub fn seeded() -> Self {
        let mut tables = Tables::default();
        let guest = User {
            id: tables.next_id(),
            email: GUEST_EMAIL.to_string(),
            password_hash: "!".to_string(),
            created: Utc::now(),
        };
        tables.users.insert(guest.id, guest);
        Self {
            tables: RwLock::new(tables),
        }
    }
}

fn compare_folders(a: &Folder, b: &Folder, column: &str) -> Ordering {
    match column {
        "name" => a.name.cmp(&b.name),
        "created" => a.created.cmp(&b.created),
        "updated" => a.updated.cmp(&b.updated),
        _ => a.id.cmp(&b.id),
    }
}

fn compare_tasks(a: &Task, b: &Task, column: &str) -> Ordering {
    match column {
        "title" => a.title.cmp(&b.title),
        "datetime" => a.datetime.cmp(&b.datetime),
        "status" => a.status.cmp(&b.status),
        "created" => a.created.cmp(&b.created),
        _ => a.id.cmp(&b.id),
    }
}

/// Sorts by the validated column with `id ASC` as tie-breaker, then slices one page.
fn paginate<T: Clone>(
    mut rows: Vec<T>,
    filters: &ValidatedFilters,
    compare: fn(&T, &T, &str) -> Ordering,
) -> Page<T> {
    let column = filters.sort_column();
    let direction = filters.sort_direction();
    rows.sort_by(|a, b| {
        let primary = compare(a, b, column);
        let primary = match direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| compare(a, b, "id"))
    });

    let total = rows.len() as i64;
    let items: Vec<T> = rows
        .into_iter()
        .skip(filters.offset() as usize)
        .take(filters.limit() as usize)
        .collect();
    // Window-counted SQL reports no total for an empty page.
    let total_records = if items.is_empty() { 0 } else { total };
    Page {
        items,
        total_records,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: tables.next_id(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: i64) -> StoreResult<User> {
        let tables = self.tables.read().await;
        tables.users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(
        &self,
        hash: &[u8],
        user_id: i64,
        expiry: DateTime<Utc>,
        scope: TokenScope,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.tokens.insert(
            hash.to_vec(),
            TokenRow {
                user_id,
                expiry,
                scope,
            },
        );
        Ok(())
    }

    async fn user_id_for_hash(&self, scope: TokenScope, hash: &[u8]) -> StoreResult<Option<i64>> {
        let tables = self.tables.read().await;
        let now = Utc::now();
        Ok(tables
            .tokens
            .get(hash)
            .filter(|row| row.scope == scope && row.expiry > now)
            .map(|row| row.user_id))
    }

    async fn delete_by_hash(&self, hash: &[u8]) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        Ok(tables.tokens.remove(hash).map_or(0, |_| 1))
    }

    async fn delete_for_user(&self, scope: TokenScope, user_id: i64) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.tokens.len();
        tables
            .tokens
            .retain(|_, row| !(row.scope == scope && row.user_id == user_id));
        Ok((before - tables.tokens.len()) as u64)
    }
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn insert(&self, user_id: i64, name: &str) -> StoreResult<Folder> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let folder = Folder {
            id: tables.next_id(),
            name: name.to_string(),
            user_id,
            created: now,
            updated: now,
        };
        tables.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn get(&self, id: i64) -> StoreResult<Folder> {
        let tables = self.tables.read().await;
        tables.folders.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_by_user(&self, user_id: i64, filters: &ValidatedFilters) -> StoreResult<Page<Folder>> {
        let tables = self.tables.read().await;
        let rows = tables
            .folders
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(rows, filters, compare_folders))
    }

    async fn update(&self, id: i64, name: Option<&str>) -> StoreResult<Folder> {
        let mut tables = self.tables.write().await;
        let folder = tables.folders.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(name) = name {
            folder.name = name.to_string();
        }
        folder.updated = Utc::now();
        Ok(folder.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.folders.remove(&id).ok_or(StoreError::NotFound)?;
        tables.tasks.retain(|_, t| t.folder_id != id);
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert(&self, folder_id: i64, task: &NewTask) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;
        if !tables.folders.contains_key(&folder_id) {
            return Err(StoreError::Database(format!(
                "folder {} violates tasks.folder_id foreign key",
                folder_id
            )));
        }
        let now = Utc::now();
        let task = Task {
            id: tables.next_id(),
            title: task.title.clone(),
            description: task.description.clone(),
            datetime: task.datetime,
            status: task.status,
            folder_id,
            created: now,
            updated: now,
        };
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get(&self, id: i64) -> StoreResult<Task> {
        let tables = self.tables.read().await;
        tables.tasks.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_by_folder(
        &self,
        folder_id: i64,
        filter: &TaskFilter,
        filters: &ValidatedFilters,
    ) -> StoreResult<Page<Task>> {
        let tables = self.tables.read().await;
        let rows = tables
            .tasks
            .values()
            .filter(|t| t.folder_id == folder_id)
            .filter(|t| {
                TaskFilter {
                    folder_ids: Vec::new(),
                    ..filter.clone()
                }
                .matches(t)
            })
            .cloned()
            .collect();
        Ok(paginate(rows, filters, compare_tasks))
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        filter: &TaskFilter,
        filters: &ValidatedFilters,
    ) -> StoreResult<Page<Task>> {
        let tables = self.tables.read().await;
        let rows = tables
            .tasks
            .values()
            .filter(|t| {
                tables
                    .folders
                    .get(&t.folder_id)
                    .map_or(false, |f| f.user_id == user_id)
            })
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        Ok(paginate(rows, filters, compare_tasks))
    }

    async fn update(&self, id: i64, changes: &TaskChanges) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;
        if let Some(folder_id) = changes.folder_id {
            if !tables.folders.contains_key(&folder_id) {
                return Err(StoreError::Database(format!(
                    "folder {} violates tasks.folder_id foreign key",
                    folder_id
                )));
            }
        }
        let task = tables.tasks.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(title) = &changes.title {
            task.title = title.clone();
        }
        if let Some(description) = &changes.description {
            task.description = description.clone();
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(datetime) = changes.datetime {
            task.datetime = datetime;
        }
        if let Some(folder_id) = changes.folder_id {
            task.folder_id = folder_id;
        }
        task.updated = Utc::now();
        Ok(task.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.tasks.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
