//! Error types for the REST client.
//!
//! # Design
//! `ApiError` names what went wrong; `RequestError` adds which call it was.
//! Every failure from `Client::get` / `Client::post` comes back as a
//! `RequestError` so callers always see the method and URL, while
//! `RequestError::kind` still lets them match on the cause.

use thiserror::Error;

use crate::http::HttpMethod;

/// Error produced by a `Transport` when the request could not be exchanged.
///
/// Each transport wraps its own error type; the text is shown unchanged.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }

    /// The wrapped error, for downcasting to the transport's own type.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        Self::new(err)
    }
}

/// Cause of a failed request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The target did not resolve to a valid URL.
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The request payload could not be serialized to JSON.
    #[error("error encoding JSON body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The transport failed to exchange the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with anything other than 200 OK.
    #[error("Status: {status} {reason}\nBody  : {body}")]
    Status {
        status: u16,
        reason: String,
        /// `Content-Type` of the error response, when the server sent one.
        content_type: Option<String>,
        body: String,
    },

    /// The response body could not be read.
    #[error("error reading body: {0}")]
    BodyRead(#[source] std::io::Error),

    /// The response body was not valid JSON for the expected type.
    #[error("error decoding JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// HTTP status of a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// A failed `get` or `post` call, with the method and URL that were attempted.
#[derive(Debug, Error)]
#[error("error in restup request\nMethod : {method}\nURL    : {url}\n{source}")]
pub struct RequestError {
    pub method: HttpMethod,
    pub url: String,
    #[source]
    pub source: ApiError,
}

impl RequestError {
    pub(crate) fn new(method: HttpMethod, url: impl Into<String>, source: ApiError) -> Self {
        Self {
            method,
            url: url.into(),
            source,
        }
    }

    pub fn kind(&self) -> &ApiError {
        &self.source
    }

    pub fn into_kind(self) -> ApiError {
        self.source
    }
}
