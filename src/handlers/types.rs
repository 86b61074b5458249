//! Shared handler types: the success envelope and pagination handling.
//!
//! Pagination parameters arrive as raw strings and are normalized rather
//! than rejected: garbage falls back to defaults, fractions are truncated,
//! and the page size is clamped to [1, 100].

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Upper bound on the page size after clamping.
pub const MAX_PAGE_SIZE: u64 = 100;
const DEFAULT_PAGE_SIZE: u64 = 20;

/// Success envelope: `{success: true, data, meta?}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    pub fn with_meta(data: T, meta: PageMeta) -> Self {
        Self {
            success: true,
            data,
            meta: Some(meta),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

/// Build list metadata; an empty result set has zero pages.
pub fn build_meta(page: u64, page_size: u64, total_count: u64) -> PageMeta {
    let total_pages = if total_count == 0 {
        0
    } else {
        total_count.div_ceil(page_size)
    };
    PageMeta {
        page,
        page_size,
        total_count,
        total_pages,
    }
}

/// Raw pagination query parameters, accepted as strings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<String>,
    /// Items per page, clamped to [1, 100]
    pub page_size: Option<String>,
}

/// Normalized pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u64,
    pub page_size: u64,
}

impl PaginationParams {
    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

fn parse_numeric(raw: Option<&String>) -> Option<i64> {
    let value: f64 = raw?.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.trunc() as i64)
}

impl From<&PageQuery> for PaginationParams {
    fn from(query: &PageQuery) -> Self {
        let page = parse_numeric(query.page.as_ref()).unwrap_or(1).max(1) as u64;
        let page_size = parse_numeric(query.page_size.as_ref())
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as u64;
        Self { page, page_size }
    }
}
