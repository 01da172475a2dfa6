//! Client configuration assembled before the first request.
//!
//! `ClientConfig` is plain data that hosts can deserialize from whatever
//! config source they already have. `ClientBuilder` is the fluent way to
//! produce the same thing in code, plus an optional custom transport.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::client::Client;
use crate::transport::{Transport, UreqTransport, DEFAULT_TIMEOUT};

fn default_timeout_ms() -> u64 {
    duration_to_ms(DEFAULT_TIMEOUT)
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Settings for a `Client`.
///
/// Every field is optional when deserializing; `timeout_ms` defaults to
/// 30 000. A zero timeout falls back to the default.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for relative targets. May be empty when callers pass full URLs.
    pub base_url: String,
    /// Raw credential, e.g. `user:pass`. Encoded to Basic-Auth on build.
    pub token: String,
    /// Extra headers sent with every request.
    pub headers: HashMap<String, String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            headers: HashMap::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        match self.timeout_ms {
            0 => DEFAULT_TIMEOUT,
            ms => Duration::from_millis(ms),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("headers", &self.headers)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Fluent constructor for `Client`.
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Box<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    /// Same replacement rule as `Client::add_header`: a later name matching
    /// case-insensitively replaces the earlier entry.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.config
            .headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.config.headers.insert(name, value.into());
        self
    }

    /// Overall timeout for the default transport, kept to millisecond
    /// precision. Ignored when a custom transport is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = duration_to_ms(timeout);
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn build(self) -> Client {
        let timeout = self.config.timeout();
        let transport = self
            .transport
            .unwrap_or_else(|| Box::new(UreqTransport::with_timeout(timeout)) as Box<dyn Transport>);
        let mut client = Client::with_transport(&self.config.base_url, &self.config.token, transport);
        for (name, value) in self.config.headers {
            client.add_header(name, value);
        }
        client
    }
}
