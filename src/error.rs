//! Error types shared by the transport, the payload parser and the city
//! data client.

use reqwest::{StatusCode, Url};
use thiserror::Error;

/// A response body that parsed but does not have the shape we expect.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("missing `{0}` array")]
    MissingArray(&'static str),

    #[error("expected a list of names, found {0}")]
    NotANameList(&'static str),
}

/// Failure of a single call to the air-quality service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or a non-success HTTP status.
    ///
    /// `message` is the server-supplied `detail` when the error body
    /// carried one, otherwise a generic description.
    #[error("{message}")]
    Network {
        status: Option<StatusCode>,
        message: String,
    },

    /// The response arrived but is missing the fields we need.
    #[error("malformed response from {endpoint}: {source}")]
    Malformed {
        endpoint: String,
        #[source]
        source: PayloadError,
    },

    #[error("invalid service URL: {0}")]
    InvalidUrl(String),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub(crate) fn transport(url: &Url, err: reqwest::Error) -> Self {
        ClientError::Network {
            status: err.status(),
            message: format!("request to {} failed: {}", url, err),
        }
    }

    /// Builds the error for a non-success status, preferring the JSON
    /// `detail` string of the body when there is one.
    pub(crate) fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));

        let message = match detail {
            Some(detail) => detail,
            None => format!(
                "API error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string(),
        };

        ClientError::Network {
            status: Some(status),
            message,
        }
    }

    pub(crate) fn malformed(endpoint: &str, source: PayloadError) -> Self {
        ClientError::Malformed {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    /// Network failures can be retried by the user; malformed data cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Network { status, .. } => *status,
            _ => None,
        }
    }
}
