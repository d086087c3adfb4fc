use serde::{Deserialize, Serialize};

/// JSON body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable kind: `not-found`, `already-closed`, `conflict`,
    /// `invalid`, `transient` or `internal`.
    pub error: String,
    /// Message meant for the person using the client.
    pub message: String,
    /// Whether resending the same request may succeed.
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            retryable,
            field: None,
        }
    }

    /// Validation failure pointing at one input field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: "invalid".to_string(),
            message: message.into(),
            retryable: false,
            field: Some(field.into()),
        }
    }
}
