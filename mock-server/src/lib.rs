//! Test API for exercising a JSON REST client over real HTTP.
//!
//! Routes:
//! - `GET|POST /echo` answers 200 with a JSON description of the request.
//! - `GET /status/{code}` answers with `code` and a JSON error body.
//! - `GET /malformed` answers 200 with a body that is not JSON.
//! - `POST /items` answers 201 Created with the posted item.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::num::ParseIntError;

use axum::{
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::debug;

/// What `/echo` saw: method, headers (names lowercased) and the JSON body.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", get(echo).post(echo))
        .route("/status/{code}", get(status))
        .route("/malformed", get(malformed))
        .route("/items", post(create_item))
}

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 3000;

/// Loopback address to serve on. `port` is the raw `PORT` setting, if any.
pub fn listen_addr(port: Option<&str>) -> Result<SocketAddr, ParseIntError> {
    let port = match port.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw.parse()?,
        _ => DEFAULT_PORT,
    };
    Ok(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    debug!(%method, "echo");
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = serde_json::from_str(&body).ok();
    Json(Echo {
        method: method.to_string(),
        headers,
        body,
    })
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<ErrorBody>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let error = status.canonical_reason().unwrap_or("unknown").to_string();
    Ok((status, Json(ErrorBody { error })))
}

async fn malformed() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "not-json")
}

async fn create_item(Json(item): Json<Item>) -> (StatusCode, Json<Item>) {
    (StatusCode::CREATED, Json(item))
}
