use thiserror::Error;

/// Failure taxonomy for the search pipeline.
///
/// `Provider` is non-fatal as long as at least one other provider succeeds;
/// the Executor absorbs and logs it. `ExecutionFailed` and `Persistence` are
/// fatal for the request and surface both to the immediate caller and to the
/// background status table.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("provider '{provider}' failed: {cause}")]
    Provider { provider: String, cause: String },

    #[error("execution failed: {reason} ({attempts} provider attempt(s))")]
    ExecutionFailed { attempts: usize, reason: String },

    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl SearchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn provider(provider: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Provider {
            provider: provider.into(),
            cause: cause.to_string(),
        }
    }

    pub fn persistence(cause: impl std::fmt::Display) -> Self {
        Self::Persistence(cause.to_string())
    }

    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Provider { .. })
    }
}

impl From<sea_orm::DbErr> for SearchError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Persistence(err.to_string())
    }
}
