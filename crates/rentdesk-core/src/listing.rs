//! Listing query construction and pagination

use rentdesk_auth::AuthUser;
use rentdesk_db::{PropertyQuery, PropertyType};
use serde::Deserialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;

/// Raw listing parameters as they arrive in the query string
///
/// Everything is kept as text so that malformed values fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub area: Option<String>,
    pub search: Option<String>,
    pub created_by: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: positive_or(page, DEFAULT_PAGE),
            limit: positive_or(limit, DEFAULT_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn positive_or(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(default)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Build the store query for `actor`
///
/// Non-admin callers are always scoped to their own listings, whatever
/// `createdBy` they ask for.
pub fn build_query(params: &ListingParams, actor: &AuthUser) -> (PropertyQuery, Page) {
    let page = Page::parse(params.page.as_deref(), params.limit.as_deref());

    let created_by = if actor.is_admin() {
        non_blank(&params.created_by)
    } else {
        Some(actor.id.clone())
    };

    let query = PropertyQuery {
        property_type: params
            .property_type
            .as_deref()
            .and_then(|t| t.trim().parse::<PropertyType>().ok()),
        area: non_blank(&params.area),
        search: non_blank(&params.search),
        created_by,
        offset: page.offset(),
        limit: page.limit,
    };

    (query, page)
}

/// Number of pages needed for `total` items
pub fn page_count(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
