use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use super::{announce_ready, decode_reply, deliver, EventSink, Transport};
use crate::config::TransportKind;
use crate::query::Query;

/// Form-encoded POST, as the CGI script expects.
pub struct HttpFormTransport {
    client: Client,
    endpoint: String,
    events: Option<EventSink>,
}

impl HttpFormTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            events: None,
        }
    }
}

#[async_trait]
impl Transport for HttpFormTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::HttpForm
    }

    async fn initialize(&mut self, events: EventSink) {
        info!(endpoint = %self.endpoint, "using form-encoded calculation script");
        announce_ready(&events);
        self.events = Some(events);
    }

    fn submit(&self, query: Query) {
        let Some(events) = self.events.clone() else {
            warn!("submit before initialize; query dropped");
            return;
        };
        let request = self
            .client
            .post(&self.endpoint)
            .form(&query.to_form_pairs());
        tokio::spawn(async move {
            let result = match request.send().await {
                Ok(reply) => decode_reply(reply).await,
                Err(err) => Err(err.into()),
            };
            deliver(&events, result);
        });
    }
}
