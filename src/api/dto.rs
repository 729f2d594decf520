//! REST API response data transfer objects

use serde::Serialize;

use crate::service::registry::PersonRecord;

/// Person response
#[derive(Debug, Serialize)]
pub struct PersonDto {
    pub person_id: i64,
    pub name: String,
    pub registered_at: i64,
}

impl From<PersonRecord> for PersonDto {
    fn from(record: PersonRecord) -> Self {
        Self {
            person_id: record.person_id,
            name: record.name,
            registered_at: record.registered_at,
        }
    }
}

/// Unregister response
#[derive(Debug, Serialize)]
pub struct UnregisterResponse {
    pub success: bool,
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            code: code.to_string(),
        }
    }
}
