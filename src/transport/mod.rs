//! Ways of getting a query to the calculation backend.
//!
//! Every transport reports through an event channel: `Ready` once it can
//! accept work, then one `Response` per submission. Transport failures are
//! turned into failure responses, so `submit` itself never fails.

pub mod http_form;
pub mod http_json;
pub mod worker;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::{TransportConfig, TransportKind};
use crate::error::TransportError;
use crate::query::Query;
use crate::response::Response;

pub use http_form::HttpFormTransport;
pub use http_json::HttpJsonTransport;
pub use worker::WorkerTransport;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Ready,
    Response(Response),
}

pub type EventSink = mpsc::UnboundedSender<TransportEvent>;

#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Start the transport. `Ready` is sent on `events` once submissions
    /// can be accepted; for some transports that happens later.
    async fn initialize(&mut self, events: EventSink);

    /// Send a query. Exactly one `Response` event follows. There is no
    /// timeout and no way to cancel.
    fn submit(&self, query: Query);
}

pub fn from_config(config: &TransportConfig) -> Box<dyn Transport> {
    let endpoint = config.endpoint();
    match config.kind {
        TransportKind::HttpJson => Box::new(HttpJsonTransport::new(endpoint)),
        TransportKind::HttpForm => Box::new(HttpFormTransport::new(endpoint)),
        TransportKind::Worker => {
            Box::new(WorkerTransport::new(config.worker_command.clone(), endpoint))
        }
    }
}

/// Send a response, or its transport failure, to the event sink.
pub(crate) fn announce_ready(events: &EventSink) {
    if events.send(TransportEvent::Ready).is_err() {
        debug!("event receiver closed; dropping ready notice");
    }
}

pub(crate) fn deliver(events: &EventSink, result: Result<Response, TransportError>) {
    let response = result.unwrap_or_else(|err| {
        warn!(error = %err, "calculation request failed");
        Response::transport_failure(err)
    });
    if events.send(TransportEvent::Response(response)).is_err() {
        debug!("event receiver closed; dropping response");
    }
}

/// Decode a backend reply. The body is JSON whatever the status; the
/// server reports its own errors as JSON with a 500.
pub(crate) async fn decode_reply(reply: reqwest::Response) -> Result<Response, TransportError> {
    let status = reply.status();
    let body = reply.bytes().await?;
    debug!(%status, bytes = body.len(), "backend replied");
    Ok(serde_json::from_slice(&body)?)
}
