use crate::variables::VariableKind;
use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("invalid number of submatches for {0} variable")]
    InvalidSubmatches(VariableKind),
    #[error("invalid {field} in replacement template: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("index step must be greater than zero: {0}")]
    InvalidStep(String),
    #[error("invalid find pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("metadata lookup failed for {}: {source}", .path.display())]
    Provider {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("sorting the batch failed: {0}")]
    Sort(#[source] BoxError),
}

impl ReplaceError {
    pub(crate) fn provider(path: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        Self::Provider {
            path: path.into(),
            source: err.into(),
        }
    }

    pub(crate) fn sort(err: anyhow::Error) -> Self {
        Self::Sort(err.into())
    }

    pub(crate) fn invalid_number(field: &'static str, value: &str) -> Self {
        Self::InvalidNumber {
            field,
            value: value.to_string(),
        }
    }
}

pub type Result<T, E = ReplaceError> = std::result::Result<T, E>;
