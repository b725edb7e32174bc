/*
[INPUT]:  Mock console server
[OUTPUT]: Wired tail components and request-count helpers
[POS]:    Test infrastructure - shared across integration tests
[UPDATE]: When component wiring or fixtures change
*/

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chaperone_adapter::{ClientConfig, ConsoleClient, Credentials, TailSource};
use chaperone_tail::{
    Document, LogTailPoller, MessageArea, PollerConfig, RenderPolicy, SessionNavigator,
};
use tokio::time::Instant;
use wiremock::MockServer;

pub const TEST_INTERVAL: Duration = Duration::from_millis(50);

pub struct Harness {
    pub document: Arc<Document>,
    pub messages: Arc<MessageArea>,
    pub navigator: Arc<SessionNavigator>,
    pub poller: LogTailPoller,
}

impl Harness {
    pub fn new(server: &MockServer, client_config: ClientConfig, policy: RenderPolicy) -> Self {
        let mut client = ConsoleClient::with_config_and_base_url(client_config, &server.uri())
            .expect("client init");
        client.set_credentials(Credentials::session("test-session"));

        let document = Arc::new(Document::new());
        let messages = Arc::new(MessageArea::new());
        let navigator = Arc::new(SessionNavigator::new("/login", document.clone()));
        let poller = LogTailPoller::new(
            Arc::new(client),
            document.clone(),
            messages.clone(),
            navigator.clone(),
            PollerConfig {
                interval: TEST_INTERVAL,
                policy,
                ..PollerConfig::default()
            },
        );

        Self {
            document,
            messages,
            navigator,
            poller,
        }
    }

    /// Create the container and output regions a chain needs.
    pub fn mount(&self, source: &TailSource) {
        self.document.create_container(&source.container_region_id());
        self.document.ensure_output(&source.output_region_id());
    }

    pub fn output_text(&self, source: &TailSource) -> String {
        self.document
            .output(&source.output_region_id())
            .map(|region| region.text())
            .unwrap_or_default()
    }
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

pub async fn wait_for_request_count(server: &MockServer, expected: usize, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    loop {
        let count = request_count(server).await;
        if count >= expected {
            return;
        }
        if Instant::now() >= deadline {
            panic!("timed out waiting for {expected} requests, last count={count}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
