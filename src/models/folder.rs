use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A named container of tasks owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderDto {
    #[validate(length(min = 1, max = 30, message = "must be between 1 and 30 characters"))]
    pub name: String,
}

/// Partial update; only the name is mutable.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateFolderDto {
    #[validate(length(min = 1, max = 30, message = "must be between 1 and 30 characters"))]
    pub name: Option<String>,
}
