//! Pagination query parameters and the response metadata block.

use coresvc_core::ListParams;
use serde::{Deserialize, Serialize};

/// `?page=&pageSize=` query parameters. Both optional; [`ListParams::new`]
/// normalizes non-positive or over-max values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PaginationQuery {
    #[must_use]
    pub fn into_list_params(self) -> ListParams {
        ListParams::new(self.page.unwrap_or(1), self.page_size.unwrap_or(0))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    #[must_use]
    pub fn new(params: ListParams, total: i64) -> Self {
        Self {
            page: params.page(),
            page_size: params.page_size(),
            total,
            total_pages: params.total_pages(total),
        }
    }
}
