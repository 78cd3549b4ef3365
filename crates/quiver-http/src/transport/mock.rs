//! Scriptable in-memory transport for tests.
//!
//! The handle is cheaply cloneable; keep one clone to script responses and
//! inspect recorded operations after handing another to the client.

use super::{EventSink, Transport, TransportEvent};
use crate::request::{HttpMethod, ResponseKind};
use parking_lot::Mutex;
use std::sync::Arc;
use url::Url;

/// Recorded transport operations, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOp {
    Open { method: HttpMethod, url: String },
    Header { name: String, value: String },
    Timeout(u64),
    ResponseKind(ResponseKind),
    WithCredentials(bool),
    OverrideMime(String),
    Send { body: Option<Vec<u8>> },
    Abort,
}

#[derive(Default)]
struct MockState {
    ops: Vec<MockOp>,
    script: Vec<TransportEvent>,
    aborted: bool,
}

/// A [`Transport`] whose terminal events are scripted ahead of time.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    sink: Arc<Mutex<Option<EventSink>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue events to emit, in order, when `send` is called.
    pub fn script(&self, events: Vec<TransportEvent>) {
        self.state.lock().script = events;
    }

    /// Script a single successful completion.
    pub fn respond(&self, status: u16, raw_headers: &str, body: &[u8]) {
        self.script(vec![TransportEvent::Ready {
            status,
            raw_headers: raw_headers.to_string(),
            body: body.to_vec(),
        }]);
    }

    /// Recorded operations so far.
    pub fn ops(&self) -> Vec<MockOp> {
        self.state.lock().ops.clone()
    }

    /// Whether `send` was ever called.
    pub fn sent(&self) -> bool {
        self.state
            .lock()
            .ops
            .iter()
            .any(|op| matches!(op, MockOp::Send { .. }))
    }

    /// The body handed to the last `send`, if any.
    pub fn sent_body(&self) -> Option<Vec<u8>> {
        self.state.lock().ops.iter().rev().find_map(|op| match op {
            MockOp::Send { body } => body.clone(),
            _ => None,
        })
    }

    /// Push an event through the installed sink directly.
    pub fn emit(&self, event: TransportEvent) {
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink {
            sink(event);
        }
    }

    /// Boxed clone for handing to a client or factory.
    pub fn boxed(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }
}

impl Transport for MockTransport {
    fn open(&mut self, method: HttpMethod, url: &Url) {
        self.state.lock().ops.push(MockOp::Open {
            method,
            url: url.to_string(),
        });
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.state.lock().ops.push(MockOp::Header {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn set_timeout(&mut self, ms: u64) {
        self.state.lock().ops.push(MockOp::Timeout(ms));
    }

    fn set_response_kind(&mut self, kind: ResponseKind) {
        self.state.lock().ops.push(MockOp::ResponseKind(kind));
    }

    fn set_with_credentials(&mut self, enabled: bool) {
        self.state.lock().ops.push(MockOp::WithCredentials(enabled));
    }

    fn override_mime(&mut self, mime: &str) {
        self.state
            .lock()
            .ops
            .push(MockOp::OverrideMime(mime.to_string()));
    }

    fn subscribe(&mut self, sink: EventSink) {
        *self.sink.lock() = Some(sink);
    }

    fn send(&mut self, body: Option<Vec<u8>>) {
        let script = {
            let mut state = self.state.lock();
            if state.aborted {
                return;
            }
            state.ops.push(MockOp::Send { body });
            std::mem::take(&mut state.script)
        };
        for event in script {
            self.emit(event);
        }
    }

    fn abort(&mut self) {
        {
            let mut state = self.state.lock();
            if state.aborted {
                return;
            }
            state.aborted = true;
            state.ops.push(MockOp::Abort);
        }
        self.emit(TransportEvent::Abort);
    }
}
