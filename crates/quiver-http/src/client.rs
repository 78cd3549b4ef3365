//! Client façade composing configuration, hooks, URL building, and the
//! transport adapter behind per-verb convenience methods.

use crate::config::ClientConfig;
use crate::error::HttpResult;
use crate::hooks;
use crate::request::{CallOptions, HttpMethod, Payload};
use crate::response::Response;
use crate::search::SearchParams;
use crate::transport::reqwest::ReqwestTransport;
use crate::transport::{perform, Transport, TransportFactory};
use crate::urls::UrlContext;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Configurable HTTP request client.
///
/// # Example
///
/// ```ignore
/// use quiver_http::{Client, ClientConfig, ContentType, UrlContext};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let context = UrlContext::new("https://api.example.com", "https:");
///     let config = ClientConfig::new()
///         .base("/v1")
///         .content_type(ContentType::Json);
///
///     let client = Client::over_reqwest(context, Some(config));
///     let response = client.get("/users", None, None).await?;
///     println!("status: {}", response.status);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: RwLock<ClientConfig>,
    context: UrlContext,
    transport: Box<dyn TransportFactory>,
}

impl Client {
    /// New client over an injected transport factory and execution context.
    pub fn new(
        transport: impl TransportFactory + 'static,
        context: UrlContext,
        config: Option<ClientConfig>,
    ) -> Self {
        let slot = match config {
            Some(config) => ClientConfig::merge(&ClientConfig::default(), &config),
            None => ClientConfig::default(),
        };
        Self {
            inner: Arc::new(ClientInner {
                config: RwLock::new(slot),
                context,
                transport: Box::new(transport),
            }),
        }
    }

    /// Convenience constructor over the default reqwest-backed transport.
    /// One shared `reqwest::Client` is reused across transfers.
    pub fn over_reqwest(context: UrlContext, config: Option<ClientConfig>) -> Self {
        let shared = reqwest::Client::new();
        Self::new(
            move || Box::new(ReqwestTransport::with_client(shared.clone())) as Box<dyn Transport>,
            context,
            config,
        )
    }

    /// Merge new values into the live configuration: right overrides left
    /// except headers, where existing keys win.
    pub fn config(&self, options: ClientConfig) {
        let mut slot = self.inner.config.write();
        *slot = ClientConfig::merge(&slot, &options);
    }

    /// Snapshot of the current configuration.
    pub fn current_config(&self) -> ClientConfig {
        self.inner.config.read().clone()
    }

    pub fn context(&self) -> &UrlContext {
        &self.inner.context
    }

    /// GET request; no payload.
    pub async fn get(
        &self,
        url: &str,
        search: Option<SearchParams>,
        options: Option<CallOptions>,
    ) -> HttpResult<Response> {
        self.dispatch(Self::call(HttpMethod::Get, url, search, None, options))
            .await
    }

    /// POST request; payload serialized per the effective content type.
    pub async fn post(
        &self,
        url: &str,
        payload: Option<Payload>,
        options: Option<CallOptions>,
    ) -> HttpResult<Response> {
        self.dispatch(Self::call(HttpMethod::Post, url, None, payload, options))
            .await
    }

    /// PUT request; payload serialized per the effective content type.
    pub async fn put(
        &self,
        url: &str,
        payload: Option<Payload>,
        options: Option<CallOptions>,
    ) -> HttpResult<Response> {
        self.dispatch(Self::call(HttpMethod::Put, url, None, payload, options))
            .await
    }

    /// PATCH request; payload serialized per the effective content type.
    pub async fn patch(
        &self,
        url: &str,
        payload: Option<Payload>,
        options: Option<CallOptions>,
    ) -> HttpResult<Response> {
        self.dispatch(Self::call(HttpMethod::Patch, url, None, payload, options))
            .await
    }

    /// DELETE request. Parameters belong in the search mapping; a body is
    /// discouraged.
    pub async fn delete(
        &self,
        url: &str,
        search: Option<SearchParams>,
        options: Option<CallOptions>,
    ) -> HttpResult<Response> {
        self.dispatch(Self::call(HttpMethod::Delete, url, search, None, options))
            .await
    }

    /// HEAD request; no payload.
    pub async fn head(
        &self,
        url: &str,
        search: Option<SearchParams>,
        options: Option<CallOptions>,
    ) -> HttpResult<Response> {
        self.dispatch(Self::call(HttpMethod::Head, url, search, None, options))
            .await
    }

    /// OPTIONS request; no payload.
    pub async fn options(
        &self,
        url: &str,
        search: Option<SearchParams>,
        options: Option<CallOptions>,
    ) -> HttpResult<Response> {
        self.dispatch(Self::call(HttpMethod::Options, url, search, None, options))
            .await
    }

    fn call(
        method: HttpMethod,
        url: &str,
        search: Option<SearchParams>,
        payload: Option<Payload>,
        options: Option<CallOptions>,
    ) -> CallOptions {
        let mut call = options.unwrap_or_default();
        call.method = Some(method);
        call.url = Some(url.to_string());
        if search.is_some() {
            call.search = search;
        }
        if payload.is_some() {
            call.payload = payload;
        }
        call
    }

    async fn dispatch(&self, call: CallOptions) -> HttpResult<Response> {
        // Snapshot the configuration at composition time; later mutations
        // do not affect this request.
        let config = self.inner.config.read().clone();
        let defaults = CallOptions::from_config(&config);
        let composed = CallOptions::compose(&defaults, &call).into_options();
        tracing::debug!(method = %composed.method, url = %composed.url, "request composed");

        let options = hooks::run_before(config.before_request.as_ref(), composed).await?;

        let transport = self.inner.transport.create();
        let response = perform(transport, options, &self.inner.context).await?;
        hooks::run_response(config.on_response.as_ref(), response)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.inner.config.read();
        f.debug_struct("Client")
            .field("base", &config.base)
            .field("timeout", &config.timeout)
            .field("context", &self.inner.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockOp, MockTransport};

    fn client_over(mock: &MockTransport) -> Client {
        let factory_mock = mock.clone();
        Client::new(
            move || factory_mock.boxed(),
            UrlContext::new("https://h.test", "https:"),
            None,
        )
    }

    #[tokio::test]
    async fn test_verbs_set_method_and_url() {
        let mock = MockTransport::new();
        let client = client_over(&mock);

        mock.respond(200, "", b"");
        client.get("/a", None, None).await.unwrap();
        mock.respond(200, "", b"");
        client.delete("/b", None, None).await.unwrap();
        mock.respond(200, "", b"");
        client.head("/c", None, None).await.unwrap();

        let opens: Vec<MockOp> = mock
            .ops()
            .into_iter()
            .filter(|op| matches!(op, MockOp::Open { .. }))
            .collect();
        assert_eq!(
            opens,
            vec![
                MockOp::Open {
                    method: HttpMethod::Get,
                    url: "https://h.test/a".to_string()
                },
                MockOp::Open {
                    method: HttpMethod::Delete,
                    url: "https://h.test/b".to_string()
                },
                MockOp::Open {
                    method: HttpMethod::Head,
                    url: "https://h.test/c".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_config_merges_into_live_slot() {
        let mock = MockTransport::new();
        let client = client_over(&mock);

        client.config(ClientConfig::new().base("/api").header("X-One", "1"));
        client.config(ClientConfig::new().header("X-Two", "2"));

        let config = client.current_config();
        assert_eq!(config.base, "/api");
        assert_eq!(config.headers["X-One"], Some("1".to_string()));
        assert_eq!(config.headers["X-Two"], Some("2".to_string()));

        mock.respond(200, "", b"");
        client.get("/users", None, None).await.unwrap();
        assert!(mock.ops().contains(&MockOp::Open {
            method: HttpMethod::Get,
            url: "https://h.test/api/users".to_string()
        }));
    }

    #[tokio::test]
    async fn test_config_headers_keep_existing_on_collision() {
        let mock = MockTransport::new();
        let client = client_over(&mock);

        client.config(ClientConfig::new().header("A", "1"));
        client.config(ClientConfig::new().header("A", "2"));
        assert_eq!(client.current_config().headers["A"], Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_search_argument_reaches_query() {
        let mock = MockTransport::new();
        let client = client_over(&mock);

        mock.respond(200, "", b"");
        client
            .get("/find", Some(SearchParams::new().with("q", "rust")), None)
            .await
            .unwrap();
        assert!(mock.ops().contains(&MockOp::Open {
            method: HttpMethod::Get,
            url: "https://h.test/find?q=rust".to_string()
        }));
    }
}
