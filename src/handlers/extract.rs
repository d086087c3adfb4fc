//! Request extractors whose rejections go through `Error`, so malformed
//! bodies, ids and query strings get the same JSON error body as every
//! other failure.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::Error;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct Query<T>(pub T);

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        let field = json_error_field(&message).unwrap_or("body").to_string();
        Error::ValidationFailed { field, message }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::validation("id", rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::validation("query", rejection.body_text())
    }
}

/// Pulls the offending field out of a serde data error such as
/// `... target type: estado: invalid type: integer`.
fn json_error_field(message: &str) -> Option<&str> {
    let (_, detail) = message.split_once("target type: ")?;
    let (path, _) = detail.split_once(": ")?;
    let field = path.rsplit('.').next()?;
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_from_type_mismatch() {
        let message = "Failed to deserialize the JSON body into the target type: \
                       estado: invalid type: integer `5`, expected a string at line 1 column 11";
        assert_eq!(json_error_field(message), Some("estado"));
    }

    #[test]
    fn test_field_from_nested_path() {
        let message = "Failed to deserialize the JSON body into the target type: \
                       mediciones.temperatura: invalid type: string \"alta\", expected f64";
        assert_eq!(json_error_field(message), Some("temperatura"));
    }

    #[test]
    fn test_no_field_for_syntax_errors() {
        assert_eq!(
            json_error_field("Failed to parse the request body as JSON: EOF while parsing"),
            None
        );
        assert_eq!(
            json_error_field(
                "Failed to deserialize the JSON body into the target type: \
                 missing field `dosis` at line 1 column 2"
            ),
            None
        );
    }
}
