//! Client-level configuration and layered merging.

use crate::error::BoxError;
use crate::hooks::{BeforeRequestHook, ResponseHook};
use crate::request::{ContentType, Headers, RequestOptions, ResponseKind};
use crate::response::Response;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Client-wide defaults layered under every call.
///
/// Lives for the whole client lifetime and is mutated in place by explicit
/// reconfiguration; in-flight requests read whatever configuration is
/// current at composition time.
#[derive(Clone, Default)]
pub struct ClientConfig {
    /// Base URL; empty means unset.
    pub base: String,
    pub headers: Headers,
    pub with_credentials: Option<bool>,
    /// Milliseconds; `Some(0)` means unbounded.
    pub timeout: Option<u64>,
    pub content_type: Option<ContentType>,
    pub response_kind: Option<ResponseKind>,
    /// Single-slot pre-request hook; a later registration replaces an
    /// earlier one.
    pub before_request: Option<BeforeRequestHook>,
    /// Single-slot post-response hook.
    pub on_response: Option<ResponseHook>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), Some(value.into()));
        self
    }

    /// Record a header as explicitly unset; the transport skips it.
    pub fn unset_header(mut self, name: impl Into<String>) -> Self {
        self.headers.insert(name.into(), None);
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

    /// Register the pre-request hook. It receives the fully composed
    /// descriptor and returns the descriptor used verbatim for the transfer.
    pub fn before_request<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(RequestOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RequestOptions, BoxError>> + Send + 'static,
    {
        self.before_request = Some(Arc::new(move |options| Box::pin(hook(options))));
        self
    }

    /// Register the post-response hook. Its result is what the caller
    /// ultimately receives.
    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response) -> Result<Response, BoxError> + Send + Sync + 'static,
    {
        self.on_response = Some(Arc::new(hook));
        self
    }

    /// Layer `right` over `left`.
    ///
    /// Right wins for base (non-empty), with_credentials, timeout,
    /// content_type, response_kind, and both hooks. Headers are the
    /// documented exception: an existing left key keeps its value.
    pub fn merge(left: &ClientConfig, right: &ClientConfig) -> ClientConfig {
        let mut headers = right.headers.clone();
        headers.extend(left.headers.clone());

        ClientConfig {
            base: if right.base.is_empty() {
                left.base.clone()
            } else {
                right.base.clone()
            },
            headers,
            with_credentials: right.with_credentials.or(left.with_credentials),
            timeout: right.timeout.or(left.timeout),
            content_type: right.content_type.or(left.content_type),
            response_kind: right.response_kind.or(left.response_kind),
            before_request: right
                .before_request
                .clone()
                .or_else(|| left.before_request.clone()),
            on_response: right.on_response.clone().or_else(|| left.on_response.clone()),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base", &self.base)
            .field("headers", &self.headers)
            .field("with_credentials", &self.with_credentials)
            .field("timeout", &self.timeout)
            .field("content_type", &self.content_type)
            .field("response_kind", &self.response_kind)
            .field("before_request", &self.before_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_right_wins_for_base() {
        let left = ClientConfig::new().base("/left");
        let right = ClientConfig::new().base("/right");
        assert_eq!(ClientConfig::merge(&left, &right).base, "/right");

        let empty_right = ClientConfig::new();
        assert_eq!(ClientConfig::merge(&left, &empty_right).base, "/left");
    }

    #[test]
    fn test_merge_right_wins_for_scalars() {
        let left = ClientConfig::new()
            .with_credentials(false)
            .timeout(100)
            .content_type(ContentType::Text)
            .response_kind(ResponseKind::Text);
        let right = ClientConfig::new()
            .with_credentials(true)
            .timeout(200)
            .content_type(ContentType::Json)
            .response_kind(ResponseKind::Json);

        let merged = ClientConfig::merge(&left, &right);
        assert_eq!(merged.with_credentials, Some(true));
        assert_eq!(merged.timeout, Some(200));
        assert_eq!(merged.content_type, Some(ContentType::Json));
        assert_eq!(merged.response_kind, Some(ResponseKind::Json));
    }

    #[test]
    fn test_merge_headers_left_precedent_on_collision() {
        let left = ClientConfig::new().header("A", "1");
        let right = ClientConfig::new().header("A", "2");
        let merged = ClientConfig::merge(&left, &right);
        assert_eq!(merged.headers["A"], Some("1".to_string()));
    }

    #[test]
    fn test_merge_headers_keeps_right_only_keys() {
        let left = ClientConfig::new().header("A", "1");
        let right = ClientConfig::new().header("B", "2");
        let merged = ClientConfig::merge(&left, &right);
        assert_eq!(merged.headers["A"], Some("1".to_string()));
        assert_eq!(merged.headers["B"], Some("2".to_string()));
    }

    #[test]
    fn test_merge_later_hook_replaces_earlier() {
        let left = ClientConfig::new().on_response(|mut response| {
            response.error = Some("left".into());
            Ok(response)
        });
        let right = ClientConfig::new().on_response(Ok);

        let merged = ClientConfig::merge(&left, &right);
        let hook = merged.on_response.unwrap();
        let response = Response::new(
            200,
            Default::default(),
            Vec::new(),
            crate::request::CallOptions::new().into_options(),
        );
        let out = hook(response).unwrap();
        assert_eq!(out.error, None);
    }

    #[test]
    fn test_merge_keeps_left_hook_when_right_unset() {
        let left = ClientConfig::new().on_response(Ok);
        let right = ClientConfig::new();
        let merged = ClientConfig::merge(&left, &right);
        assert!(merged.on_response.is_some());
    }
}
