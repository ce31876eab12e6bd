//! RFC 7807 `application/problem+json` response body.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ValidationErrorItem {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Problem {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub code: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "validationErrors", skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<ValidationErrorItem>>,
}
