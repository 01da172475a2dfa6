//! Small blocking client for JSON REST APIs behind Basic-Auth.
//!
//! # Overview
//! `Client` sends GET and POST requests with an `Authorization: Basic ...`
//! header, requires a `200 OK` answer, and decodes the JSON body into any
//! `DeserializeOwned` type.
//!
//! ```no_run
//! use restup::Client;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Account {
//!     id: u64,
//! }
//!
//! let mut client = Client::new("https://api.example.com", "user:pass");
//! client.add_header("X-Tenant", "acme");
//! let account: Account = client.get("/account")?;
//! # let _ = account.id;
//! # Ok::<(), restup::RequestError>(())
//! ```
//!
//! # Design
//! - Requests are plain data (`HttpRequest`) handed to a `Transport`, so
//!   tests swap the network for `MockTransport` and inspect what was sent.
//! - `Authorization` and `Content-Type` are set after custom headers and
//!   always win.
//! - Every call is one attempt. Failures come back as `RequestError`, which
//!   names the method and URL and wraps the `ApiError` cause.
//! - The crate emits `tracing` events only; nothing is printed unless the
//!   host installs a subscriber.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;

pub use client::Client;
pub use config::{ClientBuilder, ClientConfig};
pub use error::{ApiError, RequestError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{MockTransport, Transport, UreqTransport};
