//! Error types for the request helpers.
//!
//! # Design
//! Each variant of [`Error`] names the phase of the round trip that failed,
//! so a caller can tell a bad endpoint from a refused connection from a
//! non-200 reply without parsing messages. Causes stay attached as sources.
//! Non-200 responses carry the body text only for the helpers that capture
//! it; `post_form` leaves `body` empty.

use thiserror::Error;

/// Errors returned by the request helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// The endpoint could not be parsed as an absolute http(s) URL.
    #[error("invalid endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: EndpointError,
    },

    /// The request could not be assembled (bad method, header name or value).
    #[error("create request failed: {message}")]
    RequestConstruction {
        message: String,
        #[source]
        source: Option<ureq::http::Error>,
    },

    /// The request was not answered: DNS, connect, timeout, cancellation or
    /// body read failure.
    #[error("http request failed: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with something other than 200.
    #[error(
        "unexpected status code: {status}{}",
        .body.as_deref().map(|b| format!(", body: {b}")).unwrap_or_default()
    )]
    UnexpectedStatus { status: u16, body: Option<String> },

    /// The outgoing JSON body could not be serialized.
    #[error("marshal json failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The 200 response body was not JSON of the expected shape.
    #[error("decode response failed: {0}")]
    Decode(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn construction(message: impl Into<String>) -> Self {
        Error::RequestConstruction {
            message: message.into(),
            source: None,
        }
    }

    /// Status code of an `UnexpectedStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Why an endpoint string was rejected.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error(transparent)]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),
}

/// Failures below the HTTP status line.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error(transparent)]
    Request(#[from] ureq::Error),

    #[error("transport worker exited without a response")]
    WorkerLost,

    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
