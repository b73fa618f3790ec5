use std::sync::Arc;

use serde::Deserialize;
use validator::Validate;

use super::FolderService;
use crate::error::AppError;
use crate::filters::{Page, PageParams, ValidatedFilters, TASK_RULES};
use crate::models::task::STATUS_MESSAGE;
use crate::models::{CreateTaskDto, NewTask, Task, TaskChanges, TaskStatus, UpdateTaskDto};
use crate::store::{TaskFilter, TaskStore};
use crate::validation::{parse_date, parse_rfc3339, FieldErrors};

/// Query string accepted by task listings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TaskQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub status: Option<String>,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    /// Comma separated folder ids; only honoured by the user-wide listing.
    pub folder_ids: Option<String>,
}

impl TaskQuery {
    pub fn validate(&self) -> Result<(TaskFilter, ValidatedFilters), FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut filter = TaskFilter::default();

        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            match status.parse::<TaskStatus>() {
                Ok(status) => filter.status = Some(status),
                Err(()) => errors.add("status", STATUS_MESSAGE),
            }
        }

        for (field, raw, slot) in [
            ("min_date", &self.min_date, &mut filter.min_date),
            ("max_date", &self.max_date, &mut filter.max_date),
        ] {
            if let Some(raw) = raw.as_deref().filter(|s| !s.is_empty()) {
                match parse_date(raw) {
                    Some(date) => *slot = Some(date),
                    None => errors.add(field, "must be a date in YYYY-MM-DD format"),
                }
            }
        }

        if let (Some(min), Some(max)) = (filter.min_date, filter.max_date) {
            errors.check(min <= max, "max_date", "must not be before min_date");
        }

        if let Some(raw) = self.folder_ids.as_deref().filter(|s| !s.is_empty()) {
            match raw
                .split(',')
                .map(|id| id.trim().parse::<i64>())
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(ids) => filter.folder_ids = ids,
                Err(_) => errors.add("folder_ids", "must be a comma separated list of integers"),
            }
        }

        let filters = self.page.validate(&TASK_RULES);
        match filters {
            Ok(filters) if errors.is_empty() => Ok((filter, filters)),
            Ok(_) => Err(errors),
            Err(page_errors) => {
                for field in ["page", "page_size", "sort"] {
                    if let Some(message) = page_errors.get(field) {
                        errors.add(field, message);
                    }
                }
                Err(errors)
            }
        }
    }
}

fn new_task(input: CreateTaskDto) -> Result<NewTask, AppError> {
    let mut errors = FieldErrors::new();
    let datetime = parse_rfc3339(&input.datetime);
    errors.check(datetime.is_some(), "datetime", "must be valid RFC3339 date string");
    let status = match input.status.as_deref() {
        None => Some(TaskStatus::default()),
        Some(raw) => raw.parse::<TaskStatus>().ok(),
    };
    errors.check(status.is_some(), "status", STATUS_MESSAGE);

    match (datetime, status) {
        (Some(datetime), Some(status)) => Ok(NewTask {
            title: input.title,
            description: input.description,
            datetime,
            status,
        }),
        _ => Err(errors.into()),
    }
}

fn task_changes(input: UpdateTaskDto) -> Result<TaskChanges, AppError> {
    let mut errors = FieldErrors::new();
    let datetime = input.datetime.as_deref().map(parse_rfc3339);
    errors.check(
        !matches!(datetime, Some(None)),
        "datetime",
        "must be valid RFC3339 date string",
    );
    let status = input.status.as_deref().map(|s| s.parse::<TaskStatus>().ok());
    errors.check(!matches!(status, Some(None)), "status", STATUS_MESSAGE);
    errors.into_result()?;

    Ok(TaskChanges {
        title: input.title,
        description: input.description,
        datetime: datetime.flatten(),
        status: status.flatten(),
        folder_id: input.folder_id,
    })
}

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    folders: FolderService,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>, folders: FolderService) -> Self {
        Self { tasks, folders }
    }

    /// Loads a task whose folder the caller owns.
    async fn owned(&self, user_id: i64, task_id: i64) -> Result<Task, AppError> {
        let task = self.tasks.get(task_id).await?;
        self.folders
            .owned(user_id, task.folder_id)
            .await
            .map_err(|err| match err {
                AppError::Forbidden(_) => {
                    AppError::Forbidden(format!("task {} belongs to another user", task_id))
                }
                other => other,
            })?;
        Ok(task)
    }

    pub async fn create(
        &self,
        user_id: i64,
        folder_id: i64,
        input: CreateTaskDto,
    ) -> Result<Task, AppError> {
        self.folders.owned(user_id, folder_id).await?;
        input.validate()?;
        let task = new_task(input)?;
        Ok(self.tasks.insert(folder_id, &task).await?)
    }

    pub async fn get(&self, user_id: i64, task_id: i64) -> Result<Task, AppError> {
        self.owned(user_id, task_id).await
    }

    pub async fn list_for_folder(
        &self,
        user_id: i64,
        folder_id: i64,
        filter: &TaskFilter,
        filters: &ValidatedFilters,
    ) -> Result<Page<Task>, AppError> {
        self.folders.owned(user_id, folder_id).await?;
        Ok(self.tasks.list_by_folder(folder_id, filter, filters).await?)
    }

    /// Tasks across every folder the caller owns.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        filter: &TaskFilter,
        filters: &ValidatedFilters,
    ) -> Result<Page<Task>, AppError> {
        Ok(self.tasks.list_by_user(user_id, filter, filters).await?)
    }

    /// Applies a partial update. A `folder_id` change moves the task, which
    /// requires owning the destination folder as well.
    pub async fn update(
        &self,
        user_id: i64,
        task_id: i64,
        input: UpdateTaskDto,
    ) -> Result<Task, AppError> {
        self.owned(user_id, task_id).await?;
        input.validate()?;
        let changes = task_changes(input)?;

        if let Some(destination) = changes.folder_id {
            self.folders.owned(user_id, destination).await?;
        }

        Ok(self.tasks.update(task_id, &changes).await?)
    }

    pub async fn delete(&self, user_id: i64, task_id: i64) -> Result<(), AppError> {
        self.owned(user_id, task_id).await?;
        Ok(self.tasks.delete(task_id).await?)
    }
}
