use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::{Mutex, PoisonError};

use super::Transport;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

enum Reply {
    Response {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    },
    BrokenBody {
        status: u16,
    },
    Failure(String),
}

/// Test double that replays queued replies in order and records every
/// request it is asked to send.
///
/// Share it with a client through an `Arc` to inspect the recorded requests
/// afterwards:
///
/// ```
/// use std::sync::Arc;
/// use restup::{Client, MockTransport};
///
/// let mock = Arc::new(MockTransport::new());
/// mock.push_json(200, r#"{"a":1}"#);
///
/// let mut client = Client::new("http://api.test", "user:pass");
/// client.set_transport(mock.clone());
/// let value: serde_json::Value = client.get("/thing").unwrap();
///
/// assert_eq!(value["a"], 1);
/// assert_eq!(mock.requests()[0].url, "http://api.test/thing");
/// ```
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.push(Reply::Response {
            status,
            headers: Vec::new(),
            body: body.into(),
        });
    }

    /// Queue a response carrying `Content-Type: application/json`.
    pub fn push_json(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.push(Reply::Response {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.into(),
        });
    }

    /// Queue a response whose body fails on the first read.
    pub fn push_broken_body(&self, status: u16) {
        self.push(Reply::BrokenBody { status });
    }

    /// Queue a transport failure with the given message.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.push(Reply::Failure(message.into()));
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    fn push(&self, reply: Reply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match reply {
            Some(Reply::Response {
                status,
                headers,
                body,
            }) => Ok(HttpResponse::from_bytes(status, body).with_headers(headers)),
            Some(Reply::BrokenBody { status }) => Ok(HttpResponse::new(
                status,
                crate::http::canonical_reason(status),
                BrokenReader,
            )),
            Some(Reply::Failure(message)) => Err(TransportError::new(message)),
            None => Err(TransportError::new("mock transport has no queued reply")),
        }
    }
}

struct BrokenReader;

impl Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset while reading body",
        ))
    }
}
