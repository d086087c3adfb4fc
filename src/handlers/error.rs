use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::Error;
use crate::models::ErrorBody;

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::AlreadyClosed { .. } | Error::VersionConflict { .. } => StatusCode::CONFLICT,
            Error::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body shown to the client. Storage details stay in the logs.
    pub fn body(&self) -> ErrorBody {
        let retryable = self.is_retryable();
        match self {
            Error::NotFound { entity, id } => ErrorBody::new(
                "not-found",
                format!("{} con id {} no existe.", entity, id),
                retryable,
            ),
            Error::AlreadyClosed { .. } => ErrorBody::new(
                "already-closed",
                "Esta hoja de enfermería ya ha sido finalizada y no puede ser editada.",
                retryable,
            ),
            Error::VersionConflict { .. } => ErrorBody::new(
                "conflict",
                "La hoja fue modificada en otra sesión. Recarga la página e intenta de nuevo.",
                retryable,
            ),
            Error::ValidationFailed { field, message } => {
                ErrorBody::invalid_field(field.clone(), message.clone())
            }
            Error::Storage(_) => ErrorBody::new(
                "transient",
                "No se pudo completar la operación. Intenta de nuevo.",
                retryable,
            ),
            Error::PasswordHash(_) => ErrorBody::new(
                "internal",
                "No se pudo registrar la contraseña.",
                retryable,
            ),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Storage(_) | Error::PasswordHash(_) => {
                tracing::error!("✗ Request failed: {}", self)
            }
            _ => tracing::debug!("Request rejected: {}", self),
        }
        (self.status(), Json(self.body())).into_response()
    }
}
