//! Error types for the STACKIT provider.

use reqwest::StatusCode;
use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while serving a provider operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Mapping between the API model and the attribute model failed.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote API answered with a non-success status.
    #[error("Calling API: {operation}: HTTP {status}: {message}")]
    Api {
        /// What the provider was doing when the call failed.
        operation: String,
        /// The HTTP status returned by the API.
        status: StatusCode,
        /// The response body, or a short description of it.
        message: String,
    },

    /// The HTTP round trip itself failed.
    #[error("Calling API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The initiating call succeeded but the remote operation never finished.
    #[error("Wait handler error: {0}")]
    Wait(String),

    /// An import identifier did not match the expected format.
    #[error("Unexpected import identifier: expected format {expected}, got {got:?}")]
    ImportId {
        /// The expected format, e.g. `[project_id],[instance_id]`.
        expected: String,
        /// The identifier that was supplied.
        got: String,
    },

    /// A beta resource was used without opting in.
    #[error("Beta resource not enabled: {0}")]
    BetaNotEnabled(String),

    /// One or more field-scoped diagnostics.
    #[error("{}", summarize(.0))]
    Diagnostics(Vec<Diagnostic>),

    /// Create failed after the remote object came into existence.
    ///
    /// `state` identifies that object. The host stores it as tainted so a
    /// later apply replaces the object instead of orphaning it.
    #[error("{source}")]
    Partial {
        /// Identity state of the object that was created.
        state: serde_json::Value,
        /// The failure that interrupted the create.
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Build an [`ProviderError::Api`] error.
    pub fn api(operation: impl Into<String>, status: StatusCode, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    /// Build a single field-scoped error diagnostic.
    pub fn attribute(
        attribute: impl Into<String>,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Diagnostics(vec![Diagnostic::error(summary)
            .with_detail(detail)
            .with_attribute(attribute)])
    }

    /// Attach the state of an object the failed operation already created.
    ///
    /// An error that already carries state keeps its own.
    pub fn with_state(self, state: serde_json::Value) -> Self {
        match self {
            partial @ Self::Partial { .. } => partial,
            source => Self::Partial {
                state,
                source: Box::new(source),
            },
        }
    }

    /// The state to keep when a create failed halfway.
    pub fn partial_state(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Partial { state, .. } => Some(state),
            _ => None,
        }
    }

    /// Whether this error means the remote object does not exist.
    ///
    /// Read and delete use this to treat a vanished object as already gone.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Api { status, .. } => *status == StatusCode::NOT_FOUND,
            Self::Partial { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Convert the error into diagnostics for the host.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            Self::Diagnostics(diagnostics) => diagnostics,
            Self::Partial { source, .. } => source.into_diagnostics(),
            other => vec![Diagnostic::error(other.to_string())],
        }
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.attribute {
            Some(attribute) => format!("{} (at {})", d.summary, attribute),
            None => d.summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
