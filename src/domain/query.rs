//! Listing criteria: sorting, filtering and pagination for users and bugs.
//!
//! Everything here is pure. The repositories translate these criteria into
//! store queries; the HTTP layer only hands over the raw query parameters.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::SortOrder;
use super::time::start_of_day;

pub type SortSpec<F> = Vec<(F, SortOrder)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    GivenName,
    FamilyName,
    Role,
    CreatedOn,
}

impl UserSortField {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GivenName => "givenName",
            Self::FamilyName => "familyName",
            Self::Role => "role",
            Self::CreatedOn => "createdOn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BugSortField {
    Title,
    Classification,
    AssignedToName,
    CreatedByName,
    CreatedOn,
}

impl BugSortField {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Classification => "classification",
            Self::AssignedToName => "assignedToName",
            Self::CreatedByName => "createdByName",
            Self::CreatedOn => "createdOn",
        }
    }
}

/// Maps a `sortBy` keyword to the user ordering. Unknown keywords sort by given name.
#[must_use]
pub fn user_sort_options(sort_by: Option<&str>) -> SortSpec<UserSortField> {
    use SortOrder::{Ascending, Descending};
    use UserSortField::{CreatedOn, FamilyName, GivenName, Role};

    match sort_by {
        Some("givenName") => vec![
            (GivenName, Ascending),
            (FamilyName, Ascending),
            (CreatedOn, Ascending),
        ],
        Some("familyName") => vec![
            (FamilyName, Ascending),
            (GivenName, Ascending),
            (CreatedOn, Ascending),
        ],
        Some("role") => vec![
            (Role, Ascending),
            (GivenName, Ascending),
            (FamilyName, Ascending),
            (CreatedOn, Ascending),
        ],
        Some("newest") => vec![(CreatedOn, Descending)],
        Some("oldest") => vec![(CreatedOn, Ascending)],
        _ => vec![(GivenName, Ascending)],
    }
}

/// Maps a `sortBy` keyword to the bug ordering. Unknown keywords sort newest first.
#[must_use]
pub fn bug_sort_options(sort_by: Option<&str>) -> SortSpec<BugSortField> {
    use BugSortField::{AssignedToName, Classification, CreatedByName, CreatedOn, Title};
    use SortOrder::{Ascending, Descending};

    match sort_by {
        Some("title") => vec![(Title, Ascending), (CreatedOn, Descending)],
        Some("classification") => vec![(Classification, Ascending), (CreatedOn, Descending)],
        Some("assignedToName") => vec![(AssignedToName, Ascending), (CreatedOn, Descending)],
        Some("createdByName") => vec![(CreatedByName, Ascending), (CreatedOn, Descending)],
        Some("oldest") => vec![(CreatedOn, Ascending)],
        _ => vec![(CreatedOn, Descending)],
    }
}

/// Creation-date window derived from `minAge` / `maxAge` day counts.
///
/// `minAge` caps the creation date (documents at least that many days old)
/// and `maxAge` floors it, both counted back from today's midnight (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgeWindow {
    pub created_on_or_before: Option<DateTime<Utc>>,
    pub created_on_or_after: Option<DateTime<Utc>>,
}

impl AgeWindow {
    #[must_use]
    pub fn from_days(min_age: Option<i64>, max_age: Option<i64>, now: DateTime<Utc>) -> Self {
        let today = start_of_day(now);
        let days_back = |days: i64| {
            Duration::try_days(days).and_then(|span| today.checked_sub_signed(span))
        };
        Self {
            created_on_or_before: min_age.and_then(days_back),
            created_on_or_after: max_age.and_then(days_back),
        }
    }

    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.created_on_or_before.is_none() && self.created_on_or_after.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_number: u64,
    pub page_size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub const DEFAULT_PAGE_SIZE: u64 = 5;
    pub const MAX_PAGE_SIZE: u64 = 100;

    /// Largest offset the store accepts.
    const MAX_SKIP: u64 = i64::MAX as u64;

    /// Parse-with-fallback: missing, non-numeric, non-positive or out-of-range
    /// values use the defaults.
    #[must_use]
    pub fn from_params(page_number: Option<&str>, page_size: Option<&str>) -> Self {
        let defaults = Self::default();
        let page_size = parse_positive(page_size)
            .filter(|size| *size <= Self::MAX_PAGE_SIZE)
            .unwrap_or(defaults.page_size);
        let page_number = parse_positive(page_number)
            .filter(|page| {
                (page - 1)
                    .checked_mul(page_size)
                    .is_some_and(|skip| skip <= Self::MAX_SKIP)
            })
            .unwrap_or(defaults.page_number);

        Self {
            page_number,
            page_size,
        }
    }

    #[must_use]
    pub const fn skip(&self) -> u64 {
        let skip = self.page_number.saturating_sub(1).saturating_mul(self.page_size);
        if skip > Self::MAX_SKIP { Self::MAX_SKIP } else { skip }
    }

    #[must_use]
    pub const fn total_pages(&self, total: u64) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        total.div_ceil(self.page_size)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

fn parse_days(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// One page of a listing plus the size of the whole matching set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u64,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            total_pages: pagination.total_pages(total),
            pagination,
        }
    }
}

/// Raw `GET /api/users` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    pub keywords: Option<String>,
    pub role: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub sort_by: Option<String>,
    pub page_size: Option<String>,
    pub page_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    /// Case-insensitive substring over given name, family name and email.
    pub keywords: Option<String>,
    pub role: Option<String>,
    pub age: AgeWindow,
    pub sort: SortSpec<UserSortField>,
    pub pagination: Pagination,
}

impl UserQuery {
    #[must_use]
    pub fn from_params(params: UserListParams, now: DateTime<Utc>) -> Self {
        Self {
            age: AgeWindow::from_days(
                parse_days(params.min_age.as_deref()),
                parse_days(params.max_age.as_deref()),
                now,
            ),
            sort: user_sort_options(params.sort_by.as_deref()),
            pagination: Pagination::from_params(
                params.page_number.as_deref(),
                params.page_size.as_deref(),
            ),
            keywords: non_empty(params.keywords),
            role: non_empty(params.role),
        }
    }
}

/// Raw `GET /api/bugs` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugListParams {
    pub keywords: Option<String>,
    pub classification: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub sort_by: Option<String>,
    pub page_size: Option<String>,
    pub page_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugQuery {
    /// Case-insensitive substring over title, description and reproduction steps.
    pub keywords: Option<String>,
    pub classification: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub age: AgeWindow,
    pub sort: SortSpec<BugSortField>,
    pub pagination: Pagination,
}

impl BugQuery {
    #[must_use]
    pub fn from_params(params: BugListParams, now: DateTime<Utc>) -> Self {
        Self {
            age: AgeWindow::from_days(
                parse_days(params.min_age.as_deref()),
                parse_days(params.max_age.as_deref()),
                now,
            ),
            sort: bug_sort_options(params.sort_by.as_deref()),
            pagination: Pagination::from_params(
                params.page_number.as_deref(),
                params.page_size.as_deref(),
            ),
            keywords: non_empty(params.keywords),
            classification: non_empty(params.classification),
            status: non_empty(params.status),
            assigned_to: non_empty(params.assigned_to),
        }
    }
}
