//! Transport port and the per-request state machine.
//!
//! A [`Transport`] is the event-driven mechanism that performs the actual
//! transfer. [`perform`] drives it: open, configure, send, then bridge its
//! callback events to a single settlement. Exactly one terminal event settles
//! each request; cancellation flows caller to transport only.

pub mod mock;
pub mod reqwest;

use crate::error::{HttpError, HttpResult, TransportFault};
use crate::request::{normalize_json, HttpMethod, ProgressEvent, RequestOptions, ResponseKind};
use crate::response::{parse_headers, Response};
use crate::search;
use crate::urls::{self, UrlContext};
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Callback sink a transport emits lifecycle events into.
pub type EventSink = Arc<dyn Fn(TransportEvent) + Send + Sync>;

/// Lifecycle events emitted by a transport.
///
/// `Ready`, `Abort`, `Error`, and `Timeout` are terminal; a well-behaved
/// transport emits exactly one of them per transfer.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    UploadProgress(ProgressEvent),
    DownloadProgress(ProgressEvent),
    /// The transfer was aborted.
    Abort,
    /// The transfer failed below the HTTP layer.
    Error(String),
    /// The transport-enforced timeout elapsed.
    Timeout,
    /// The transfer completed with a status, a raw CRLF header block, and
    /// the body bytes.
    Ready {
        status: u16,
        raw_headers: String,
        body: Vec<u8>,
    },
}

impl TransportEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Abort | Self::Error(_) | Self::Timeout | Self::Ready { .. }
        )
    }
}

/// The event-driven transfer mechanism behind the client.
pub trait Transport: Send {
    /// Open a transfer for `method` against the resolved URL. Transfers are
    /// always asynchronous.
    fn open(&mut self, method: HttpMethod, url: &Url);

    fn set_header(&mut self, name: &str, value: &str);

    /// Timeout in milliseconds; 0 means unbounded.
    fn set_timeout(&mut self, ms: u64);

    fn set_response_kind(&mut self, kind: ResponseKind);

    fn set_with_credentials(&mut self, enabled: bool);

    fn override_mime(&mut self, mime: &str);

    /// Install the event sink. Called once, before `send`.
    fn subscribe(&mut self, sink: EventSink);

    fn send(&mut self, body: Option<Vec<u8>>);

    /// Advisory abort; must surface as a terminal `Abort` event. Irreversible.
    fn abort(&mut self);
}

/// Creates a fresh transport per request.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Box<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Box<dyn Transport> + Send + Sync,
{
    fn create(&self) -> Box<dyn Transport> {
        self()
    }
}

/// Drive one transfer to settlement.
///
/// Performs the one-time JSON normalization, resolves the wire URL, applies
/// headers (skipping explicitly unset values) and transport settings, wires
/// progress callbacks and the one-shot cancellation listener, then waits for
/// the single terminal event. A signal already triggered before send aborts
/// the transfer without ever issuing it.
pub async fn perform(
    mut transport: Box<dyn Transport>,
    mut options: RequestOptions,
    context: &UrlContext,
) -> HttpResult<Response> {
    normalize_json(&mut options)?;

    let mut url = urls::resolve(&options.base, &options.url, context)?;
    let pairs = search::flatten(&options.search);
    urls::apply_search(&mut url, &pairs);

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let sink: EventSink = Arc::new(move |event| {
        let _ = events_tx.send(event);
    });
    transport.subscribe(sink);

    transport.open(options.method, &url);
    tracing::debug!(method = %options.method, url = %url, "transfer opened");

    for (name, value) in options.headers.iter() {
        if let Some(value) = value {
            transport.set_header(name, value);
        }
    }
    transport.set_response_kind(options.response_kind);
    transport.set_with_credentials(options.with_credentials);
    transport.set_timeout(options.timeout);
    if let Some(mime) = &options.override_mime {
        transport.override_mime(mime);
    }

    // Abort requests funnel through a channel so the listener needs no
    // handle on the transport itself.
    let (abort_tx, mut abort_rx) = mpsc::unbounded_channel();
    let listener = options.signal.as_ref().map(|signal| {
        let abort_tx = abort_tx.clone();
        let id = signal.listen(move || {
            let _ = abort_tx.send(());
        });
        (signal.clone(), id)
    });

    if options.signal.as_ref().is_some_and(|signal| signal.is_cancelled()) {
        tracing::debug!("signal already triggered, aborting before send");
        transport.abort();
    } else {
        transport.send(options.payload.to_bytes());
        tracing::trace!("transfer sent");
    }

    let outcome = loop {
        tokio::select! {
            biased;
            Some(()) = abort_rx.recv() => {
                transport.abort();
            }
            event = events.recv() => match event {
                Some(TransportEvent::UploadProgress(progress)) => {
                    if let Some(callback) = &options.on_upload_progress {
                        callback(&progress);
                    }
                }
                Some(TransportEvent::DownloadProgress(progress)) => {
                    if let Some(callback) = &options.on_download_progress {
                        callback(&progress);
                    }
                }
                Some(TransportEvent::Abort) => {
                    break Err(HttpError::Transport(TransportFault::Aborted));
                }
                Some(TransportEvent::Error(message)) => {
                    break Err(HttpError::Transport(TransportFault::Failed(message)));
                }
                Some(TransportEvent::Timeout) => {
                    break Err(HttpError::Transport(TransportFault::TimedOut));
                }
                Some(TransportEvent::Ready {
                    status,
                    raw_headers,
                    body,
                }) => break Ok((status, raw_headers, body)),
                None => {
                    break Err(HttpError::Transport(TransportFault::Failed(
                        "transport closed without a terminal event".to_string(),
                    )));
                }
            },
        }
    };

    if let Some((signal, id)) = listener {
        signal.unlisten(id);
    }

    match outcome {
        Ok((status, raw_headers, body)) => {
            let response = Response::new(status, parse_headers(&raw_headers), body, options);
            if status < 100 {
                tracing::debug!(status, "transfer completed without a valid status");
                return Err(HttpError::InvalidStatus(Box::new(response)));
            }
            tracing::debug!(status, "transfer completed");
            Ok(response)
        }
        Err(error) => {
            tracing::debug!(error = %error, "transfer failed");
            Err(error)
        }
    }
}
