//! The pluggable sender behind `Client`.
//!
//! `UreqTransport` is what `Client::new` installs. `MockTransport` replays
//! canned replies and records what it was sent, for tests.

mod mock;
mod ureq_impl;

use std::sync::Arc;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub use mock::MockTransport;
pub use ureq_impl::{UreqTransport, DEFAULT_TIMEOUT};

/// Sends one request and returns the server's response.
///
/// A transport must not treat any status code as an error: non-2xx
/// responses are returned as `Ok` so the client can interpret them. `Err`
/// is reserved for failures to exchange the request at all.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}
