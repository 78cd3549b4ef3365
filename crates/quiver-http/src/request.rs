//! Request descriptors and layered composition.

use crate::config::ClientConfig;
use crate::error::{HttpError, HttpResult};
use crate::search::SearchParams;
use crate::signal::CancelSignal;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Request headers with insertion-ordered keys.
///
/// Keys keep the position of their first insertion; headers reach the
/// transport in that order. A `None` value means "explicitly unset": the key
/// is kept through merging but skipped when headers are applied to the
/// transport, letting a configuration layer suppress an inherited default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Option<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Option<String>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Fold another set in, replacing existing values in place.
    pub fn extend(&mut self, other: Headers) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }
}

impl std::ops::Index<&str> for Headers {
    type Output = Option<String>;

    fn index(&self, name: &str) -> &Option<String> {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no header named `{name}`"),
        }
    }
}

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Returns the method as a string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(format!("Invalid HTTP method: {}", s)),
        }
    }
}

/// Declared type of the request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    /// Object payloads are serialized to JSON text before send and a
    /// `Content-Type: application/json` header is injected unless one is
    /// already present.
    Json,
    Text,
    #[default]
    Unset,
}

/// Expected shape of the response body, forwarded to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Default,
    Text,
    Json,
    Bytes,
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn is_none(&self) -> bool {
        matches!(self, Payload::None)
    }

    /// Wire bytes for the transport, `None` when there is no body.
    pub(crate) fn to_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Payload::None => None,
            Payload::Json(value) => Some(value.to_string().into_bytes()),
            Payload::Text(text) => Some(text.clone().into_bytes()),
            Payload::Bytes(bytes) => Some(bytes.clone()),
        }
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Upload or download progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Callback invoked on progress events.
pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Per-call override layer; every field optional.
///
/// Layers compose with [`CallOptions::compose`] and resolve to a concrete
/// [`RequestOptions`] via [`CallOptions::into_options`].
#[derive(Clone, Default)]
pub struct CallOptions {
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub search: Option<SearchParams>,
    pub payload: Option<Payload>,
    pub base: Option<String>,
    pub headers: Headers,
    pub with_credentials: Option<bool>,
    pub timeout: Option<u64>,
    pub content_type: Option<ContentType>,
    pub response_kind: Option<ResponseKind>,
    pub signal: Option<CancelSignal>,
    pub on_upload_progress: Option<ProgressCallback>,
    pub on_download_progress: Option<ProgressCallback>,
    pub override_mime: Option<String>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), Some(value.into()));
        self
    }

    /// Suppress a header inherited from the client configuration.
    pub fn unset_header(mut self, name: impl Into<String>) -> Self {
        self.headers.insert(name.into(), None);
        self
    }

    pub fn search(mut self, search: SearchParams) -> Self {
        self.search = Some(search);
        self
    }

    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = Some(enabled);
        self
    }

    /// Timeout in milliseconds; 0 means unbounded.
    pub fn timeout(mut self, ms: u64) -> Self {
        self.timeout = Some(ms);
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = Some(kind);
        self
    }

    pub fn signal(mut self, signal: CancelSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn on_upload_progress(
        mut self,
        callback: impl Fn(&ProgressEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_upload_progress = Some(Arc::new(callback));
        self
    }

    pub fn on_download_progress(
        mut self,
        callback: impl Fn(&ProgressEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_download_progress = Some(Arc::new(callback));
        self
    }

    pub fn override_mime(mut self, mime: impl Into<String>) -> Self {
        self.override_mime = Some(mime.into());
        self
    }

    /// Layer `right` over `left`.
    ///
    /// Right wins for every field except headers, where an existing left key
    /// keeps its value; search maps shallow-merge with right keys overriding.
    /// Folding layers left-to-right is associative.
    pub fn compose(left: &CallOptions, right: &CallOptions) -> CallOptions {
        let mut headers = right.headers.clone();
        headers.extend(left.headers.clone());

        CallOptions {
            method: right.method.or(left.method),
            url: right.url.clone().or_else(|| left.url.clone()),
            search: match (&left.search, &right.search) {
                (Some(l), Some(r)) => Some(SearchParams::merged(l, r)),
                (Some(l), None) => Some(l.clone()),
                (None, r) => r.clone(),
            },
            payload: right.payload.clone().or_else(|| left.payload.clone()),
            base: right
                .base
                .clone()
                .filter(|base| !base.is_empty())
                .or_else(|| left.base.clone().filter(|base| !base.is_empty())),
            headers,
            with_credentials: right.with_credentials.or(left.with_credentials),
            timeout: right.timeout.or(left.timeout),
            content_type: right.content_type.or(left.content_type),
            response_kind: right.response_kind.or(left.response_kind),
            signal: right.signal.clone().or_else(|| left.signal.clone()),
            on_upload_progress: right
                .on_upload_progress
                .clone()
                .or_else(|| left.on_upload_progress.clone()),
            on_download_progress: right
                .on_download_progress
                .clone()
                .or_else(|| left.on_download_progress.clone()),
            override_mime: right
                .override_mime
                .clone()
                .or_else(|| left.override_mime.clone()),
        }
    }

    /// Defaults layer derived from the client configuration snapshot.
    pub(crate) fn from_config(config: &ClientConfig) -> CallOptions {
        CallOptions {
            base: if config.base.is_empty() {
                None
            } else {
                Some(config.base.clone())
            },
            headers: config.headers.clone(),
            with_credentials: config.with_credentials,
            timeout: config.timeout,
            content_type: config.content_type,
            response_kind: config.response_kind,
            ..CallOptions::default()
        }
    }

    /// Resolve to a concrete descriptor, filling defaults.
    pub fn into_options(self) -> RequestOptions {
        RequestOptions {
            method: self.method.unwrap_or(HttpMethod::Get),
            url: self.url.unwrap_or_default(),
            search: self.search.unwrap_or_default(),
            payload: self.payload.unwrap_or_default(),
            base: self.base.unwrap_or_default(),
            headers: self.headers,
            with_credentials: self.with_credentials.unwrap_or(false),
            timeout: self.timeout.unwrap_or(0),
            content_type: self.content_type.unwrap_or_default(),
            response_kind: self.response_kind.unwrap_or_default(),
            signal: self.signal,
            on_upload_progress: self.on_upload_progress,
            on_download_progress: self.on_download_progress,
            override_mime: self.override_mime,
        }
    }
}

/// Concrete, fully resolved request descriptor.
///
/// Created fresh per call; immutable once handed to the transport adapter
/// except the one-time JSON normalization in [`normalize_json`].
#[derive(Clone)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub url: String,
    pub search: SearchParams,
    pub payload: Payload,
    pub base: String,
    pub headers: Headers,
    pub with_credentials: bool,
    /// Milliseconds; 0 means unbounded.
    pub timeout: u64,
    pub content_type: ContentType,
    pub response_kind: ResponseKind,
    pub signal: Option<CancelSignal>,
    pub on_upload_progress: Option<ProgressCallback>,
    pub on_download_progress: Option<ProgressCallback>,
    pub override_mime: Option<String>,
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("base", &self.base)
            .field("content_type", &self.content_type)
            .field("response_kind", &self.response_kind)
            .field("timeout", &self.timeout)
            .field("with_credentials", &self.with_credentials)
            .field("override_mime", &self.override_mime)
            .finish()
    }
}

/// One-time JSON normalization before hand-off to the transport: an
/// object-typed payload under `ContentType::Json` becomes serialized text,
/// and `Content-Type: application/json` is injected unless a content-type
/// header is already present (case-insensitive).
pub(crate) fn normalize_json(options: &mut RequestOptions) -> HttpResult<()> {
    if options.content_type != ContentType::Json {
        return Ok(());
    }
    if let Payload::Json(value) = &options.payload {
        let text = serde_json::to_string(value)
            .map_err(|error| HttpError::Json(error.to_string()))?;
        options.payload = Payload::Text(text);

        let has_content_type = options
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("content-type"));
        if !has_content_type {
            options.headers.insert(
                "Content-Type".to_string(),
                Some("application/json".to_string()),
            );
        }
    }
    Ok(())
}
