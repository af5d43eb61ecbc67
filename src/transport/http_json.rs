use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use super::{announce_ready, decode_reply, deliver, EventSink, Transport};
use crate::config::TransportKind;
use crate::query::Query;

/// JSON POST to the calculation API.
pub struct HttpJsonTransport {
    client: Client,
    endpoint: String,
    events: Option<EventSink>,
}

impl HttpJsonTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            events: None,
        }
    }
}

#[async_trait]
impl Transport for HttpJsonTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::HttpJson
    }

    async fn initialize(&mut self, events: EventSink) {
        info!(endpoint = %self.endpoint, "using JSON calculation API");
        announce_ready(&events);
        self.events = Some(events);
    }

    fn submit(&self, query: Query) {
        let Some(events) = self.events.clone() else {
            warn!("submit before initialize; query dropped");
            return;
        };
        let request = self.client.post(&self.endpoint).json(&query);
        tokio::spawn(async move {
            let result = match request.send().await {
                Ok(reply) => decode_reply(reply).await,
                Err(err) => Err(err.into()),
            };
            deliver(&events, result);
        });
    }
}
