//! Default transport backed by `reqwest`.
//!
//! One transport instance drives one transfer. The reqwest call runs on a
//! spawned task racing a cancellation token; lifecycle events flow back
//! through the subscribed sink.

use super::{EventSink, Transport, TransportEvent};
use crate::request::{HttpMethod, ProgressEvent, ResponseKind};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

/// [`Transport`] implementation over a `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
    method: Option<HttpMethod>,
    url: Option<Url>,
    headers: Vec<(String, String)>,
    timeout: u64,
    response_kind: ResponseKind,
    with_credentials: bool,
    mime_override: Option<String>,
    sink: Option<EventSink>,
    cancel: CancellationToken,
    sent: bool,
    aborted: bool,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Build over a shared, pre-configured `reqwest::Client` so connection
    /// pooling and cookie state survive across transfers.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            method: None,
            url: None,
            headers: Vec::new(),
            timeout: 0,
            response_kind: ResponseKind::Default,
            with_credentials: false,
            mime_override: None,
            sink: None,
            cancel: CancellationToken::new(),
            sent: false,
            aborted: false,
        }
    }

    fn dispatch(&self, event: TransportEvent) {
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReqwestTransport {
    fn open(&mut self, method: HttpMethod, url: &Url) {
        self.method = Some(method);
        self.url = Some(url.clone());
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn set_timeout(&mut self, ms: u64) {
        self.timeout = ms;
    }

    fn set_response_kind(&mut self, kind: ResponseKind) {
        self.response_kind = kind;
    }

    fn set_with_credentials(&mut self, enabled: bool) {
        self.with_credentials = enabled;
    }

    fn override_mime(&mut self, mime: &str) {
        self.mime_override = Some(mime.to_string());
    }

    fn subscribe(&mut self, sink: EventSink) {
        self.sink = Some(sink);
    }

    fn send(&mut self, body: Option<Vec<u8>>) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        let (Some(method), Some(url)) = (self.method, self.url.clone()) else {
            sink(TransportEvent::Error("transfer was not opened".to_string()));
            return;
        };
        self.sent = true;

        // Credential handling is a property of the underlying client
        // (cookie store), not of a single transfer.
        tracing::trace!(
            with_credentials = self.with_credentials,
            "credentials are managed by the reqwest client"
        );

        let client = self.client.clone();
        let mut headers = self.headers.clone();
        if self.response_kind == ResponseKind::Json
            && !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("accept"))
        {
            headers.push(("Accept".to_string(), "application/json".to_string()));
        }
        let timeout = self.timeout;
        let mime_override = self.mime_override.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let transfer = async {
                let mut request = client.request(to_reqwest_method(method), url);
                for (name, value) in &headers {
                    request = request.header(name.as_str(), value.as_str());
                }
                if timeout > 0 {
                    request = request.timeout(Duration::from_millis(timeout));
                }
                if let Some(body) = body {
                    let total = body.len() as u64;
                    request = request.body(body);
                    sink(TransportEvent::UploadProgress(ProgressEvent {
                        loaded: total,
                        total: Some(total),
                    }));
                }

                let mut response = match request.send().await {
                    Ok(response) => response,
                    Err(error) if error.is_timeout() => {
                        sink(TransportEvent::Timeout);
                        return;
                    }
                    Err(error) => {
                        sink(TransportEvent::Error(error.to_string()));
                        return;
                    }
                };

                let status = response.status().as_u16();
                let total = response.content_length();
                let mut raw_headers = String::new();
                let mut saw_content_type = false;
                for (name, value) in response.headers() {
                    let Ok(value) = value.to_str() else { continue };
                    if let Some(mime) = &mime_override {
                        if name.as_str().eq_ignore_ascii_case("content-type") {
                            saw_content_type = true;
                            raw_headers.push_str(&format!("{name}: {mime}\r\n"));
                            continue;
                        }
                    }
                    raw_headers.push_str(&format!("{name}: {value}\r\n"));
                }
                if let Some(mime) = &mime_override {
                    if !saw_content_type {
                        raw_headers.push_str(&format!("content-type: {mime}\r\n"));
                    }
                }

                let mut body = Vec::new();
                loop {
                    match response.chunk().await {
                        Ok(Some(chunk)) => {
                            body.extend_from_slice(&chunk);
                            sink(TransportEvent::DownloadProgress(ProgressEvent {
                                loaded: body.len() as u64,
                                total,
                            }));
                        }
                        Ok(None) => break,
                        Err(error) if error.is_timeout() => {
                            sink(TransportEvent::Timeout);
                            return;
                        }
                        Err(error) => {
                            sink(TransportEvent::Error(error.to_string()));
                            return;
                        }
                    }
                }

                sink(TransportEvent::Ready {
                    status,
                    raw_headers,
                    body,
                });
            };

            tokio::select! {
                _ = cancel.cancelled() => sink(TransportEvent::Abort),
                () = transfer => {}
            }
        });
    }

    fn abort(&mut self) {
        if self.aborted {
            return;
        }
        self.aborted = true;
        self.cancel.cancel();
        // Without an in-flight task there is nothing to observe the token,
        // so the terminal event is emitted here.
        if !self.sent {
            self.dispatch(TransportEvent::Abort);
        }
    }
}
