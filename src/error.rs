// ⚠️ Library errors
// Only catalog construction and id-based convenience calls can fail.
// Ledger mutation and evaluation never return errors.

use crate::schema::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog failed validation ({} problem(s)): {}", .0.len(), summarize(.0))]
    Invalid(Vec<ValidationError>),

    #[error("failed to parse catalog document")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read catalog file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Validation problems, empty for parse/read failures
    pub fn problems(&self) -> &[ValidationError] {
        match self {
            CatalogError::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .take(3)
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown species id: {0}")]
    UnknownSpecies(String),
}
