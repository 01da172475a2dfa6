//! Authenticated JSON client for a REST API.
//!
//! # Design
//! `Client` holds a base URL, the Basic-Auth header value (encoded once at
//! construction), extra headers and a boxed `Transport`. Each `get` / `post`
//! is a single linear attempt: build the request, send it, require exactly
//! 200 OK, read the body, decode JSON. Nothing is retried and nothing is
//! recovered locally.
//!
//! Mutators take `&mut self`, so configuration is finished before a client
//! can be shared across threads.

use std::collections::HashMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientBuilder, ClientConfig};
use crate::error::{ApiError, RequestError};
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::{Transport, UreqTransport};

const CONTENT_TYPE_JSON: &str = "application/json";

/// Synchronous JSON client with Basic-Auth.
pub struct Client {
    base_url: String,
    auth_token: String,
    headers: HashMap<String, String>,
    transport: Box<dyn Transport>,
}

impl Client {
    /// Client for `base_url` authenticating with `token` (e.g. `user:pass`).
    ///
    /// Uses `UreqTransport` with a 30 second timeout. Pass an empty
    /// `base_url` to call `get` / `post` with full URLs.
    pub fn new(base_url: &str, token: &str) -> Self {
        Self::with_transport(base_url, token, Box::new(UreqTransport::new()))
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn from_config(config: ClientConfig) -> Self {
        ClientBuilder::from_config(config).build()
    }

    pub(crate) fn with_transport(base_url: &str, token: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: encode_basic_auth(token),
            headers: HashMap::new(),
            transport,
        }
    }

    /// Replace the transport, e.g. with a `MockTransport` in tests.
    pub fn set_transport(&mut self, transport: impl Transport + 'static) {
        self.transport = Box::new(transport);
    }

    /// Send `name: value` with every request. A later call with the same
    /// name (compared case-insensitively) replaces the earlier value.
    ///
    /// `Authorization` and `Content-Type` are always overwritten by the
    /// client's own values when a request is built.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The `Authorization` header value sent with every request.
    pub fn auth_header(&self) -> &str {
        &self.auth_token
    }

    /// GET `target` and decode the JSON response.
    pub fn get<T: DeserializeOwned>(&self, target: &str) -> Result<T, RequestError> {
        let url = self.join(target);
        self.execute(HttpMethod::Get, url, None)
    }

    /// Like `get`, writing into `out`. `out` is untouched on failure.
    pub fn get_into<T: DeserializeOwned>(&self, target: &str, out: &mut T) -> Result<(), RequestError> {
        *out = self.get(target)?;
        Ok(())
    }

    /// POST `payload` as JSON to `target` and decode the JSON response.
    pub fn post<P, T>(&self, target: &str, payload: &P) -> Result<T, RequestError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.join(target);
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(e) => return Err(RequestError::new(HttpMethod::Post, url, ApiError::Encode(e))),
        };
        self.execute(HttpMethod::Post, url, Some(body))
    }

    /// Like `post`, writing into `out`. `out` is untouched on failure.
    pub fn post_into<P, T>(&self, target: &str, payload: &P, out: &mut T) -> Result<(), RequestError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        *out = self.post(target, payload)?;
        Ok(())
    }

    fn execute<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        url: String,
        body: Option<String>,
    ) -> Result<T, RequestError> {
        let result = self
            .build_request(method, &url, body)
            .and_then(|request| self.send_and_decode(request));
        result.map_err(|source| RequestError::new(method, url, source))
    }

    /// Combine `target` with the base URL. Absolute targets and an empty base
    /// URL pass `target` through unchanged.
    fn join(&self, target: &str) -> String {
        if self.base_url.is_empty() || is_absolute(target) {
            return target.to_string();
        }
        if target.is_empty() || target.starts_with('?') {
            return format!("{}{target}", self.base_url);
        }
        format!("{}/{}", self.base_url, target.trim_start_matches('/'))
    }

    fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<String>,
    ) -> Result<HttpRequest, ApiError> {
        if let Err(source) = Url::parse(url) {
            return Err(ApiError::InvalidUrl {
                url: url.to_string(),
                source,
            });
        }

        let mut request = HttpRequest::new(method, url);
        for (name, value) in &self.headers {
            request.set_header(name, value);
        }
        request.set_header("Authorization", &self.auth_token);
        request.set_header("Content-Type", CONTENT_TYPE_JSON);
        request.body = body;
        Ok(request)
    }

    fn send_and_decode<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let mut response = self.transport.send(request)?;
        debug!(status = response.status, "received response");

        if response.status != 200 {
            let body = response
                .read_body()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default();
            warn!(status = response.status, reason = %response.reason, "request was not successful");
            return Err(ApiError::Status {
                status: response.status,
                content_type: response.header("Content-Type").map(str::to_string),
                reason: std::mem::take(&mut response.reason),
                body,
            });
        }

        let body = response.read_body().map_err(ApiError::BodyRead)?;
        serde_json::from_slice(&body).map_err(ApiError::Decode)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

fn encode_basic_auth(token: &str) -> String {
    format!("Basic {}", STANDARD.encode(token))
}

fn is_absolute(target: &str) -> bool {
    Url::parse(target)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::transport::MockTransport;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Payload {
        a: i64,
    }

    fn client_with(mock: &Arc<MockTransport>) -> Client {
        let mut client = Client::new("http://api.test", "user:pass");
        client.set_transport(mock.clone());
        client
    }

    #[test]
    fn token_is_encoded_as_basic_auth() {
        let client = Client::new("http://api.test", "user:pass");
        assert_eq!(client.auth_header(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn get_decodes_ok_response() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(200, r#"{"a":1}"#);

        let out: Payload = client_with(&mock).get("/things").unwrap();
        assert_eq!(out, Payload { a: 1 });

        let req = mock.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://api.test/things");
        assert!(req.body.is_none());
    }

    #[test]
    fn post_sends_json_body_and_decodes() {
        #[derive(Serialize)]
        struct Query<'a> {
            name: &'a str,
        }

        let mock = Arc::new(MockTransport::new());
        mock.push_json(200, r#"{"a":1}"#);

        let mut out = Payload::default();
        client_with(&mock)
            .post_into("/search", &Query { name: "x" }, &mut out)
            .unwrap();
        assert_eq!(out, Payload { a: 1 });

        let req = mock.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "x"}));
    }

    #[test]
    fn not_found_leaves_out_untouched() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(404, r#"{"error":"missing"}"#);

        let mut out = Payload { a: 7 };
        let err = client_with(&mock).get_into("/missing", &mut out).unwrap_err();

        assert_eq!(out, Payload { a: 7 });
        assert!(err.kind().is_not_found());
        assert_eq!(err.method, HttpMethod::Get);
        assert_eq!(err.url, "http://api.test/missing");
        match err.kind() {
            ApiError::Status {
                reason,
                content_type,
                body,
                ..
            } => {
                assert_eq!(reason, "Not Found");
                assert_eq!(content_type.as_deref(), Some("application/json"));
                assert_eq!(body, r#"{"error":"missing"}"#);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn created_is_not_success() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(201, r#"{"a":1}"#);

        let mut out = Payload::default();
        let err = client_with(&mock)
            .post_into("/things", &serde_json::json!({}), &mut out)
            .unwrap_err();
        assert_eq!(err.kind().status(), Some(201));

        mock.push_response(500, "plain failure");
        let err = client_with(&mock).get::<Payload>("/x").unwrap_err();
        assert!(matches!(
            err.kind(),
            ApiError::Status { status: 500, content_type: None, .. }
        ));
        assert_eq!(out, Payload::default());
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(200, "not-json");

        let mut out = Payload { a: 3 };
        let err = client_with(&mock).get_into("/x", &mut out).unwrap_err();
        assert!(matches!(err.kind(), ApiError::Decode(_)));
        assert_eq!(out, Payload { a: 3 });
    }

    #[test]
    fn transport_failure_propagates_unchanged() {
        let mock = Arc::new(MockTransport::new());
        mock.push_failure("connection refused");

        let err = client_with(&mock).get::<Payload>("/x").unwrap_err();
        match err.kind() {
            ApiError::Transport(inner) => assert_eq!(inner.to_string(), "connection refused"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mock.requests().len(), 1, "no retry");
    }

    #[test]
    fn body_read_failure_is_reported() {
        let mock = Arc::new(MockTransport::new());
        mock.push_broken_body(200);

        let err = client_with(&mock).get::<Payload>("/x").unwrap_err();
        assert!(matches!(err.kind(), ApiError::BodyRead(_)));
    }

    #[test]
    fn extra_headers_sent_alongside_mandatory_ones() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(200, r#"{"a":1}"#);

        let mut client = client_with(&mock);
        client.add_header("X-Foo", "bar");
        let _: Payload = client.get("/x").unwrap();

        let req = mock.last_request().unwrap();
        assert_eq!(req.header("X-Foo"), Some("bar"));
        assert_eq!(req.header("Authorization"), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn mandatory_headers_win_over_custom_ones() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(200, r#"{"a":1}"#);

        let mut client = client_with(&mock);
        client.add_header("Authorization", "tampered");
        client.add_header("content-type", "text/plain");
        let _: Payload = client.get("/x").unwrap();

        let req = mock.last_request().unwrap();
        assert_eq!(req.header("Authorization"), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        let auth_count = req
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("authorization"))
            .count();
        assert_eq!(auth_count, 1);
    }

    #[test]
    fn add_header_last_write_wins() {
        let mut client = Client::new("", "t");
        client.add_header("X-Foo", "one");
        client.add_header("x-foo", "two");
        assert_eq!(client.headers, HashMap::from([("x-foo".to_string(), "two".to_string())]));
    }

    #[test]
    fn injected_transport_is_used() {
        let first = Arc::new(MockTransport::new());
        let second = Arc::new(MockTransport::new());
        second.push_json(200, r#"{"a":2}"#);

        let mut client = client_with(&first);
        client.set_transport(second.clone());
        let out: Payload = client.get("/x").unwrap();

        assert_eq!(out, Payload { a: 2 });
        assert!(first.requests().is_empty());
        assert_eq!(second.requests().len(), 1);
    }

    #[test]
    fn target_resolution() {
        let client = Client::new("http://api.test/v1/", "t");
        assert_eq!(client.join("/items"), "http://api.test/v1/items");
        assert_eq!(client.join("items"), "http://api.test/v1/items");
        assert_eq!(client.join(""), "http://api.test/v1");
        assert_eq!(client.join("?page=2"), "http://api.test/v1?page=2");
        assert_eq!(client.join("https://other.test/x"), "https://other.test/x");

        let bare = Client::new("", "t");
        assert_eq!(bare.join("http://api.test/full"), "http://api.test/full");
    }

    #[test]
    fn invalid_url_fails_before_sending() {
        let mock = Arc::new(MockTransport::new());
        let mut client = Client::new("", "t");
        client.set_transport(mock.clone());

        let err = client.get::<Payload>("not a url").unwrap_err();
        assert!(matches!(err.kind(), ApiError::InvalidUrl { .. }));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn unserializable_payload_is_an_encode_error() {
        // Maps with non-string keys cannot be encoded as JSON objects.
        let payload: HashMap<(i32, i32), i32> = HashMap::from([((1, 2), 3)]);

        let mock = Arc::new(MockTransport::new());
        let err = client_with(&mock).post::<_, Payload>("/x", &payload).unwrap_err();
        assert!(matches!(err.kind(), ApiError::Encode(_)));
        assert_eq!(err.method, HttpMethod::Post);
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn builder_applies_config() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(200, r#"{"a":1}"#);

        let client = Client::builder()
            .base_url("http://api.test")
            .token("user:pass")
            .header("X-Tenant", "acme")
            .transport(mock.clone())
            .build();
        let _: Payload = client.get("/x").unwrap();

        let req = mock.last_request().unwrap();
        assert_eq!(req.url, "http://api.test/x");
        assert_eq!(req.header("X-Tenant"), Some("acme"));
        assert_eq!(req.header("Authorization"), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn client_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Client>();
    }
}
