//! Success response envelope: `{ "data": ... }`, optionally carrying a
//! `pagination` block for list responses.

use serde::Serialize;

use super::pagination::PaginationMeta;

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> DataEnvelope<T> {
    #[must_use]
    pub fn single(data: T) -> Self {
        Self {
            data,
            pagination: None,
        }
    }

    #[must_use]
    pub fn list(data: T, pagination: PaginationMeta) -> Self {
        Self {
            data,
            pagination: Some(pagination),
        }
    }
}
