use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::validation::validate_rfc3339;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum; variants order the same way.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Default,
    Important,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Default,
        TaskStatus::Important,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Default => "default",
            TaskStatus::Important => "important",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

pub(crate) const STATUS_MESSAGE: &str = "must be one of: default, important, cancelled";

pub fn validate_status(value: &str) -> Result<(), ValidationError> {
    value.parse::<TaskStatus>().map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("status");
        err.message = Some(Cow::Borrowed(STATUS_MESSAGE));
        err
    })
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// When the task is scheduled.
    pub datetime: DateTime<Utc>,
    pub status: TaskStatus,
    pub folder_id: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Input structure for creating a task inside a folder.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskDto {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 500, message = "must be between 0 and 500 characters"))]
    pub description: String,

    /// RFC 3339 timestamp, kept as text so a bad format becomes a field error.
    #[validate(custom = "validate_rfc3339")]
    pub datetime: String,

    #[validate(custom = "validate_status")]
    pub status: Option<String>,
}

/// Partial update. `folder_id` moves the task to another folder.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskDto {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 500, message = "must be between 0 and 500 characters"))]
    pub description: Option<String>,

    #[validate(custom = "validate_status")]
    pub status: Option<String>,

    #[validate(custom = "validate_rfc3339")]
    pub datetime: Option<String>,

    pub folder_id: Option<i64>,
}

/// Validated, typed form of a task write handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub datetime: DateTime<Utc>,
    pub status: TaskStatus,
}

/// Validated, typed form of a partial task update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub folder_id: Option<i64>,
}
