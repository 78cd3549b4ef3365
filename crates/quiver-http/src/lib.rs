//! quiver-http: configurable async HTTP client over a pluggable
//! event-driven transport.
//!
//! The client layers configuration merging, deterministic URL composition
//! against an injected execution context, recursive query-parameter
//! flattening, single-slot lifecycle hooks, and cancellation/progress wiring
//! atop a callback-based [`transport::Transport`] port.
//!
//! # Architecture
//!
//! - [`Client`]: per-verb façade holding the live configuration slot
//! - [`config::ClientConfig`] / [`request::CallOptions`]: layered
//!   configuration merged right-over-left (headers excepted)
//! - [`search`]: nested search trees flattened into ordered query pairs
//! - [`urls`]: base + path resolution against an injected [`UrlContext`]
//! - [`hooks`]: pre-request and post-response transforms
//! - [`transport`]: the event port, the request state machine, and the
//!   default reqwest-backed implementation

pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod request;
pub mod response;
pub mod search;
pub mod signal;
pub mod transport;
pub mod urls;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{BoxError, HttpError, HttpErrorCategory, HttpResult, TransportFault};
pub use request::{
    CallOptions, ContentType, Headers, HttpMethod, Payload, ProgressEvent, RequestOptions,
    ResponseKind,
};
pub use response::Response;
pub use search::{SearchParams, SearchValue};
pub use signal::CancelSignal;
pub use transport::{Transport, TransportEvent, TransportFactory};
pub use urls::UrlContext;
