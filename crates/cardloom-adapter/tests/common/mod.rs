/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for cardloom-adapter tests

use cardloom_adapter::{CardloomClient, ClientConfig, Credentials};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Mock bearer token for testing
pub fn mock_access_token() -> String {
    "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test.signature".to_string()
}

/// Client pointed at the mock server with credentials for `user-1`
pub fn authed_client(server: &MockServer) -> CardloomClient {
    let mut client =
        CardloomClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
            .expect("client init");
    client.set_credentials(Credentials {
        access_token: mock_access_token(),
        user_id: "user-1".to_string(),
    });
    client
}

/// Task resource body in the backend's wire format
pub fn task_json(id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "user_id": "user-1",
        "created_at": "2026-04-02T09:30:00Z",
        "updated_at": "2026-04-02T09:31:00Z",
        "task_type": "file",
        "workflow_type": "extract_catalog",
        "input_data": {
            "file": { "name": "organic-chemistry.pdf", "type": "application/pdf" },
            "language": "en",
            "card_count": 40
        },
        "status": status
    })
}
