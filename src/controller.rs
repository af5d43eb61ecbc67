//! Session state behind the page: the active calculation, readiness and
//! busy flags, and the rendered results.

use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::ControllerError;
use crate::query::{build_query, Calculation, FormSnapshot};
use crate::render::{message_block, Renderer};
use crate::transport::{Transport, TransportEvent};

pub struct Controller {
    session: SessionConfig,
    transport: Box<dyn Transport>,
    active: Calculation,
    ready: bool,
    busy: bool,
    /// Form of the latest submission; the scattering section reads the
    /// flux and density text from it.
    last_form: FormSnapshot,
    /// Rendered blocks, newest first.
    results: VecDeque<String>,
}

impl Controller {
    /// Launch warnings become the first result blocks.
    pub fn new(session: SessionConfig, warnings: &[String], transport: Box<dyn Transport>) -> Self {
        let results = warnings.iter().map(|w| message_block(w)).collect();
        Self {
            session,
            transport,
            active: Calculation::Activation,
            ready: false,
            busy: false,
            last_form: FormSnapshot::new(),
            results,
        }
    }

    /// Initialize the transport. The caller feeds every event from the
    /// returned receiver back into `handle_event`.
    pub async fn start(&mut self) -> mpsc::UnboundedReceiver<TransportEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        info!(transport = self.transport.kind().as_str(), "starting transport");
        self.transport.initialize(tx).await;
        rx
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn active(&self) -> Calculation {
        self.active
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn focus(&mut self, panel: Calculation) {
        if self.active != panel {
            debug!(panel = panel.as_str(), "active calculation changed");
        }
        self.active = panel;
    }

    pub fn click(&mut self, target: Calculation, form: &FormSnapshot) -> Result<(), ControllerError> {
        self.focus(target);
        self.submit(target, form)
    }

    /// Enter in a text field submits the active calculation.
    pub fn enter(&mut self, form: &FormSnapshot) -> Result<(), ControllerError> {
        self.submit(self.active, form)
    }

    fn submit(&mut self, target: Calculation, form: &FormSnapshot) -> Result<(), ControllerError> {
        if !self.ready {
            return Err(ControllerError::NotReady);
        }
        match build_query(form, &self.session, target) {
            Ok(query) => {
                info!(calculate = target.as_str(), "submitting query");
                self.last_form = form.clone();
                self.busy = true;
                self.transport.submit(query);
            }
            Err(err) => {
                debug!(error = %err, "form rejected");
                self.results.push_front(message_block(&err.to_string()));
            }
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: TransportEvent) {
        self.busy = false;
        match event {
            TransportEvent::Ready => {
                self.ready = true;
            }
            TransportEvent::Response(response) => {
                let html = Renderer::new(&self.session).render(&response, &self.last_form);
                self.results.push_front(html);
            }
        }
    }

    pub fn results(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(String::as_str)
    }

    pub fn results_html(&self) -> String {
        self.results().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportKind;
    use crate::query::Query;
    use crate::response::Response;
    use crate::transport::EventSink;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeTransport {
        sent: Arc<Mutex<Vec<Query>>>,
        ready_on_start: bool,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        fn kind(&self) -> TransportKind {
            TransportKind::HttpJson
        }

        async fn initialize(&mut self, events: EventSink) {
            if self.ready_on_start {
                events.send(TransportEvent::Ready).unwrap();
            }
        }

        fn submit(&self, query: Query) {
            self.sent.lock().unwrap().push(query);
        }
    }

    fn form(entries: &[(&str, &str)]) -> FormSnapshot {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn ready_controller() -> (Controller, Arc<Mutex<Vec<Query>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = FakeTransport {
            sent: sent.clone(),
            ready_on_start: true,
        };
        let mut controller =
            Controller::new(SessionConfig::default(), &[], Box::new(transport));
        let mut events = controller.start().await;
        let event = events.recv().await.unwrap();
        controller.handle_event(event);
        (controller, sent)
    }

    #[tokio::test]
    async fn submissions_wait_for_ready() {
        let mut controller = Controller::new(
            SessionConfig::default(),
            &[],
            Box::new(FakeTransport::default()),
        );
        let _events = controller.start().await;
        assert!(!controller.is_ready());
        assert_eq!(
            controller.enter(&form(&[("time_off", "1")])),
            Err(ControllerError::NotReady)
        );
    }

    #[tokio::test]
    async fn enter_submits_the_focused_panel() {
        let (mut controller, sent) = ready_controller().await;
        controller.focus(Calculation::Scattering);
        controller.enter(&form(&[("time_off", "720")])).unwrap();
        assert!(controller.is_busy());

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].calculate, Calculation::Scattering);
        assert_eq!(sent[0].rest[4], "720");
    }

    #[tokio::test]
    async fn click_switches_mode() {
        let (mut controller, sent) = ready_controller().await;
        controller.focus(Calculation::Scattering);
        controller
            .click(Calculation::Activation, &form(&[("time_off", "1")]))
            .unwrap();
        assert_eq!(controller.active(), Calculation::Activation);
        assert_eq!(sent.lock().unwrap()[0].calculate, Calculation::Activation);
    }

    #[tokio::test]
    async fn responses_are_prepended_and_clear_busy() {
        let (mut controller, _) = ready_controller().await;
        controller.enter(&form(&[("time_off", "1")])).unwrap();
        controller.handle_event(TransportEvent::Response(Response::failure("first", "one")));
        controller.handle_event(TransportEvent::Response(Response::failure("second", "two")));
        assert!(!controller.is_busy());

        let blocks: Vec<&str> = controller.results().collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("Error second: two"));
        assert!(blocks[1].contains("Error first: one"));
    }

    #[tokio::test]
    async fn bad_form_renders_an_error_block() {
        let (mut controller, sent) = ready_controller().await;
        controller.enter(&form(&[("sample", "Co")])).unwrap();
        assert!(sent.lock().unwrap().is_empty());
        assert!(!controller.is_busy());
        assert!(controller.results_html().contains("form has no time_off field"));
    }

    #[test]
    fn warnings_are_listed_in_order() {
        let warnings = vec!["cutoff=x".to_string(), "abundance=y".to_string()];
        let controller = Controller::new(
            SessionConfig::default(),
            &warnings,
            Box::new(FakeTransport::default()),
        );
        let html = controller.results_html();
        assert!(html.find("cutoff=x").unwrap() < html.find("abundance=y").unwrap());
    }
}
