//! Error types for crownpeak-dqm.
//!
//! Every variant carries a stable code so that workflow hosts (and agents
//! driving them) can branch on the failure without parsing messages.

use thiserror::Error;

/// Result type alias for crownpeak-dqm operations.
pub type Result<T> = std::result::Result<T, Error>;

/// crownpeak-dqm error types.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Missing required parameter '{field}' for operation '{operation}'")]
    MissingParameter { operation: String, field: String },

    #[error("Invalid parameter '{field}': {message}")]
    InvalidParameter { field: String, message: String },

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("DQM API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed DQM API response: {0}")]
    MalformedResponse(String),

    #[error("Node error: {0}")]
    Node(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn missing(operation: impl Into<String>, field: impl Into<String>) -> Self {
        Error::MissingParameter {
            operation: operation.into(),
            field: field.into(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get the error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnsupportedOperation(_) => "UNSUPPORTED_OPERATION",
            Error::MissingParameter { .. } => "MISSING_PARAMETER",
            Error::InvalidParameter { .. } => "INVALID_PARAMETER",
            Error::Credential(_) => "CREDENTIAL_ERROR",
            Error::Api { .. } => "API_ERROR",
            Error::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Error::Node(_) => "NODE_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Storage(_) => "STORAGE_ERROR",
            Error::Http(_) => "HTTP_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// Get a sanitized error message safe for external consumers.
    ///
    /// Storage and I/O details (file paths, decryption failures) are hidden.
    /// API error bodies are passed through as the remote service sent them.
    pub fn external_message(&self) -> String {
        match self {
            Error::UnsupportedOperation(_)
            | Error::MissingParameter { .. }
            | Error::InvalidParameter { .. }
            | Error::Credential(_)
            | Error::Api { .. }
            | Error::MalformedResponse(_)
            | Error::Node(_)
            | Error::Config(_) => self.to_string(),

            Error::Storage(_) => "A storage error occurred".to_string(),
            Error::Io(_) => "An I/O error occurred".to_string(),
            Error::Json(_) => "Invalid JSON format".to_string(),

            Error::Http(e) => {
                if let Some(status) = e.status() {
                    format!("HTTP request failed with status {}", status.as_u16())
                } else if e.is_timeout() {
                    "HTTP request timed out".to_string()
                } else if e.is_connect() {
                    "Failed to connect to remote server".to_string()
                } else {
                    "HTTP request failed".to_string()
                }
            }
        }
    }

    /// Per-item error record emitted in place of a response when the batch
    /// continues past a failure.
    pub fn to_item_json(&self) -> serde_json::Value {
        let mut error = serde_json::json!({
            "code": self.code(),
            "message": self.external_message(),
        });
        if let Error::Api { status, .. } = self {
            error["status"] = serde_json::json!(status);
        }
        serde_json::json!({ "error": error })
    }
}
