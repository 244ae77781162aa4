use std::fmt;

use thiserror::Error;

use crate::EntityKind;

/// Transport or backend-level failure reported by a content provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderFailure,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The backend answered with `success: false`.
    Rejected,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderFailure::InvalidUrl => write!(f, "invalid url"),
            ProviderFailure::HttpStatus(code) => write!(f, "http status {code}"),
            ProviderFailure::Timeout => write!(f, "timeout"),
            ProviderFailure::Network => write!(f, "network error"),
            ProviderFailure::Rejected => write!(f, "request rejected"),
        }
    }
}

/// A response that does not have the paginated-fetch shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("response is missing required field `{field}`")]
    MissingField { field: String },
    #[error("field `{field}` has the wrong type, expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
    #[error("{kind} record at index {index} has no usable id")]
    MissingId { kind: EntityKind, index: usize },
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),
}

impl ShapeError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn wrong_type(field: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            field: field.into(),
            expected,
        }
    }
}

/// Failure of a single page load. Always recoverable through a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("malformed response: {0}")]
    Shape(#[from] ShapeError),
}

impl LoadError {
    /// Message suitable for an inline "retry" banner.
    pub fn user_message(&self) -> String {
        match self {
            LoadError::Provider(err) => match err.kind {
                ProviderFailure::Timeout => "The server took too long to respond.".to_string(),
                ProviderFailure::Rejected if !err.message.is_empty() => err.message.clone(),
                _ => "Could not load more items.".to_string(),
            },
            LoadError::Shape(_) => "The server sent an unexpected response.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown content type '{0}'")]
    UnknownContentType(String),
    #[error("unknown connection class '{0}'")]
    UnknownConnectionClass(String),
    #[error("invalid root margin '{0}'")]
    InvalidRootMargin(String),
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}
