use thiserror::Error;

/// Errors produced by the domain rules and the storage layer.
///
/// Every variant maps to exactly one HTTP status in `handlers::error`, so the
/// client can tell a closed sheet from a missing one or a flaky database.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("nursing sheet {id} is closed")]
    AlreadyClosed { id: i64 },

    #[error("nursing sheet {id} is at version {actual}, request expected {expected}")]
    VersionConflict { id: i64, expected: i32, actual: i32 },

    #[error("invalid {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl Error {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the same request could succeed if simply sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::VersionConflict { .. })
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        match fields.first() {
            Some((field, problems)) => {
                let message = problems
                    .first()
                    .and_then(|p| p.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| {
                        problems
                            .first()
                            .map(|p| p.code.to_string())
                            .unwrap_or_else(|| "invalid".to_string())
                    });
                Self::validation(*field, message)
            }
            None => Self::validation("body", "invalid payload"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
