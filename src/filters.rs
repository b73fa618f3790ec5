//! Pagination, sorting and result metadata shared by every collection endpoint.
//!
//! Raw query values arrive as [`PageParams`]. They only become usable through
//! [`PageParams::validate`], which checks them against a resource's
//! [`ListRules`] and yields [`ValidatedFilters`]. The sort column handed to SQL
//! is always the allow-list entry itself, never caller input.

use serde::{Deserialize, Serialize};

use crate::validation::FieldErrors;

pub const MAX_PAGE: i64 = 1_000_000;

/// Per-resource pagination and sorting policy.
#[derive(Debug, Clone, Copy)]
pub struct ListRules {
    /// Every accepted `sort` value, including the `-` descending forms.
    pub sort_safe_list: &'static [&'static str],
    pub default_sort: &'static str,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

pub const FOLDER_RULES: ListRules = ListRules {
    sort_safe_list: &[
        "id", "name", "created", "updated", "-id", "-name", "-created", "-updated",
    ],
    default_sort: "id",
    default_page_size: 20,
    max_page_size: 100,
};

pub const TASK_RULES: ListRules = ListRules {
    sort_safe_list: &[
        "id", "title", "datetime", "status", "created", "-id", "-title", "-datetime", "-status",
        "-created",
    ],
    default_sort: "id",
    default_page_size: 20,
    max_page_size: 1000,
};

/// Pagination query parameters exactly as the client sent them.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

impl PageParams {
    /// Checks every field, collecting one message per failing field.
    ///
    /// Absent values fall back to defaults; present but invalid values are
    /// always rejected.
    pub fn validate(&self, rules: &ListRules) -> Result<ValidatedFilters, FieldErrors> {
        let mut errors = FieldErrors::new();

        let page = parse_int(self.page.as_deref(), 1, "page", &mut errors);
        if let Some(page) = page {
            errors.check(page > 0, "page", "must be greater than 0");
            errors.check(page < MAX_PAGE, "page", "must be less than 1,000,000");
        }

        let page_size = parse_int(
            self.page_size.as_deref(),
            rules.default_page_size,
            "page_size",
            &mut errors,
        );
        if let Some(page_size) = page_size {
            errors.check(page_size > 0, "page_size", "must be greater than 0");
            if page_size > rules.max_page_size {
                errors.add(
                    "page_size",
                    format!("must be {} or lower", rules.max_page_size),
                );
            }
        }

        let requested = self.sort.as_deref().unwrap_or(rules.default_sort);
        let sort = rules
            .sort_safe_list
            .iter()
            .copied()
            .find(|allowed| *allowed == requested);
        if sort.is_none() {
            errors.add("sort", "invalid sort key");
        }

        match (page, page_size, sort) {
            (Some(page), Some(page_size), Some(sort)) if errors.is_empty() => {
                Ok(ValidatedFilters {
                    page,
                    page_size,
                    sort,
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_int(raw: Option<&str>, default: i64, field: &str, errors: &mut FieldErrors) -> Option<i64> {
    match raw {
        None => Some(default),
        Some(value) => match value.trim().parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => {
                errors.add(field, "must be an integer");
                None
            }
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Filters that passed validation. Only obtainable from [`PageParams::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedFilters {
    page: i64,
    page_size: i64,
    sort: &'static str,
}

impl ValidatedFilters {
    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Column name of the allow-listed sort key, without the `-` prefix.
    pub fn sort_column(&self) -> &'static str {
        self.sort.strip_prefix('-').unwrap_or(self.sort)
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with('-') {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Describes where a page sits in the full result set.
///
/// A result set with no rows serializes as `{}`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

impl Metadata {
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 || page_size <= 0 {
            return Metadata::default();
        }

        Metadata {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}

/// One page of rows plus the total number of rows matching the query.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_records: i64,
}

impl<T> Page<T> {
    pub fn metadata(&self, filters: &ValidatedFilters) -> Metadata {
        Metadata::calculate(self.total_records, filters.page(), filters.page_size())
    }
}
