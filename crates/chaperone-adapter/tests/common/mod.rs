/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for chaperone-adapter tests

use chaperone_adapter::{ClientConfig, ConsoleClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server
pub fn client_for(server: &MockServer) -> ConsoleClient {
    ConsoleClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init")
}

/// Session key used by authenticated tests
pub fn mock_session_id() -> String {
    "k1lq2m8v0d3fdx9s7pz4".to_string()
}
