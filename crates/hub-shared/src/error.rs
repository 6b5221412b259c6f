//! Error types for Hub.

use crate::kpi_survey::SurveyValidation;
use crate::rewards::RedemptionRejection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Store error on {table}: {message}")]
    Store { table: String, message: String },

    #[error("Procedure {procedure} failed: {message}")]
    Procedure { procedure: String, message: String },

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Redemption(#[from] RedemptionRejection),

    #[error(transparent)]
    Survey(#[from] SurveyValidation),

    #[error("Storage error: {0}")]
    Blob(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HubError {
    pub fn store(table: &str, message: impl Into<String>) -> Self {
        HubError::Store { table: table.to_string(), message: message.into() }
    }

    pub fn procedure(procedure: &str, message: impl Into<String>) -> Self {
        HubError::Procedure { procedure: procedure.to_string(), message: message.into() }
    }

    pub fn code(&self) -> i32 {
        match self {
            HubError::Store { .. } => -32001,
            HubError::Procedure { .. } => -32002,
            HubError::NotAuthenticated => -32003,
            HubError::NotFound(_) => -32005,
            HubError::Validation(_) => -32602,
            HubError::Redemption(_) => -32010,
            HubError::Survey(_) => -32011,
            HubError::Blob(_) => -32006,
            HubError::Config(_) => -32007,
            HubError::Io(_) => -32008,
            HubError::Json(_) => -32700,
        }
    }

    /// Fetch failures are transient: the screen keeps what it had and shows a notice.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HubError::Store { .. } | HubError::Procedure { .. } | HubError::Blob(_) | HubError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            HubError::store("rewards", "down"),
            HubError::procedure("get_user_roles", "down"),
            HubError::NotAuthenticated,
            HubError::NotFound("x".into()),
            HubError::Validation("x".into()),
            HubError::Blob("x".into()),
            HubError::Config("x".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(HubError::code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_transient_errors() {
        assert!(HubError::store("rewards", "timeout").is_transient());
        assert!(!HubError::Validation("bad".into()).is_transient());
        assert!(!HubError::NotAuthenticated.is_transient());
    }
}
