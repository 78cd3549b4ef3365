//! Response type and raw-header parsing.

use crate::error::{HttpError, HttpResult};
use crate::request::RequestOptions;
use std::collections::HashMap;

/// A completed transfer.
///
/// Built exactly once per request and settled exactly once; `options` is the
/// descriptor that produced it. `error` is populated only when the
/// post-response hook failed.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub options: RequestOptions,
    pub error: Option<String>,
}

impl Response {
    pub fn new(
        status: u16,
        headers: HashMap<String, String>,
        body: Vec<u8>,
        options: RequestOptions,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            options,
            error: None,
        }
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if status is client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if status is server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Check if status is redirect (3xx)
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Get body as text (UTF-8)
    pub fn text(&self) -> HttpResult<String> {
        String::from_utf8(self.body.clone())
            .map_err(|error| HttpError::Decode(format!("invalid UTF-8 in response: {error}")))
    }

    /// Get body as JSON
    pub fn json(&self) -> HttpResult<serde_json::Value> {
        serde_json::from_slice(&self.body)
            .map_err(|error| HttpError::Json(format!("failed to parse JSON: {error}")))
    }

    /// Get body as JSON and deserialize to type
    pub fn json_as<T: serde::de::DeserializeOwned>(&self) -> HttpResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|error| HttpError::Json(format!("failed to deserialize JSON: {error}")))
    }

    /// Get a header value (case-insensitive lookup)
    pub fn header(&self, name: &str) -> Option<&str> {
        let name_lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| key.to_lowercase() == name_lower)
            .map(|(_, value)| value.as_str())
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Check if content type is JSON
    pub fn is_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false)
    }
}

/// Parse a raw CRLF header block into a map.
///
/// Each line splits on the first `": "`; empty lines and lines without a
/// separator are dropped.
pub fn parse_headers(raw: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for line in raw.split("\r\n") {
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(": ") {
            headers.insert(name.to_string(), value.to_string());
        }
    }
    headers
}
