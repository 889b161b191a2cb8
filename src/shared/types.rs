use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

/// Pagination summary attached to list responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub has_more: bool,
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Offset pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Number of records to skip (default: 0)
    #[serde(default)]
    #[param(minimum = 0)]
    pub skip: i64,

    /// Maximum number of records to return (default: 100, max: 1000)
    #[serde(default = "default_limit")]
    #[param(minimum = 1, maximum = 1000)]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ListQuery {
    pub fn skip(&self) -> i64 {
        self.skip.max(0)
    }

    /// Get clamped limit (respects MAX_LIST_LIMIT)
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_LIST_LIMIT)
    }
}

/// One page of a filtered listing. `total` counts every matching row,
/// ignoring `skip` and `limit`.
#[derive(Debug, Clone)]
pub struct QueryPage<T> {
    pub total: i64,
    pub items: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub has_more: bool,
}

impl<T> QueryPage<T> {
    pub fn new(total: i64, items: Vec<T>, skip: i64, limit: i64) -> Self {
        let page = if limit > 0 { skip / limit + 1 } else { 1 };
        let size = items.len() as i64;
        Self {
            total,
            items,
            page,
            size,
            has_more: skip.saturating_add(limit) < total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> QueryPage<U> {
        QueryPage {
            total: self.total,
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            has_more: self.has_more,
        }
    }

    pub fn meta(&self) -> Meta {
        Meta {
            total: self.total,
            page: self.page,
            size: self.size,
            has_more: self.has_more,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}
