//! Error types for the runnerflow framework.
//!
//! A request pipeline fails in exactly one of three ways, each mapped to a
//! fixed HTTP status. Configuration and context errors complete the taxonomy.

use crate::context::ContextField;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Content type used for every failure body.
pub const PLAIN_TEXT_UTF8: &str = "text/plain; charset=utf-8";

/// A failure that halts a request pipeline.
///
/// The `Display` output is the exact response body text (without the
/// trailing newline added when the response is written).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Malformed, missing or invalid request data.
    #[error("{0}")]
    ClientInput(String),

    /// The request used a method the pipeline does not accept.
    #[error("{method} not allowed")]
    MethodNotAllowed {
        /// The offending method.
        method: String,
    },

    /// A collaborator or I/O fault while resolving request inputs.
    #[error("{0}")]
    UpstreamResolution(String),
}

impl PipelineError {
    /// Creates a client input error.
    #[must_use]
    pub fn client_input(message: impl Into<String>) -> Self {
        Self::ClientInput(message.into())
    }

    /// Creates a method-not-allowed error.
    #[must_use]
    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
        }
    }

    /// Creates an upstream resolution error.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamResolution(message.into())
    }

    /// Returns the HTTP status this error is reported with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ClientInput(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::UpstreamResolution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a short machine-readable kind, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ClientInput(_) => "client_input",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::UpstreamResolution(_) => "upstream_resolution",
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let body = format!("{self}\n");
        let mut response = (self.status(), body).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PLAIN_TEXT_UTF8));
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        response
    }
}

/// Error raised when a stage writes a context field that is already set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("context field '{field}' is already set")]
pub struct FieldConflictError {
    /// The conflicting field.
    pub field: ContextField,
}

impl FieldConflictError {
    /// Creates a new field conflict error.
    #[must_use]
    pub const fn new(field: ContextField) -> Self {
        Self { field }
    }
}

impl From<FieldConflictError> for PipelineError {
    fn from(err: FieldConflictError) -> Self {
        Self::UpstreamResolution(err.to_string())
    }
}

/// Errors raised while loading configuration or assembling routes.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No languages were configured.
    #[error("language table is empty")]
    EmptyLanguageTable,

    /// A language maps to an empty archive entry name.
    #[error("language '{language}' has an empty archive entry name")]
    EmptyEntryName {
        /// The language identifier.
        language: String,
    },

    /// The multipart size bound is zero.
    #[error("max_form_bytes must be greater than zero")]
    InvalidFormLimit,

    /// A path was registered twice in a route table.
    #[error("route '{path}' is already registered")]
    DuplicateRoute {
        /// The duplicated path.
        path: String,
    },

    /// A route path is not an absolute literal path.
    #[error("route '{path}' must start with '/' and contain no ':' or '*' segments")]
    InvalidRoute {
        /// The rejected path.
        path: String,
    },

    /// The logging subscriber could not be installed.
    #[error("Logging setup error: {0}")]
    Logging(String),

    /// Configuration could not be parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
