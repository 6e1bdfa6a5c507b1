#![allow(dead_code)]

use mockito::{Mock, ServerGuard};
use serde_json::{Value, json};
use taskboard_client::{ApiClient, ClientConfig};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn config_for(server: &ServerGuard) -> ClientConfig {
    ClientConfig::new(server.url())
}

pub fn client_for(server: &ServerGuard) -> ApiClient {
    ApiClient::new(&config_for(server)).unwrap()
}

/// A task as the backend returns it.
pub fn task_json(id: Value, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "assignedTo": "Ayesha",
        "assignedUser": {"id": 5, "name": "Ayesha", "phone": "0300 1234567"},
        "dueDate": "2025-03-01T00:00:00.000Z",
        "priority": "high",
        "status": status,
        "comments": ""
    })
}

pub async fn json_mock(
    server: &mut ServerGuard,
    method: &str,
    path: &str,
    status: usize,
    body: &Value,
) -> Mock {
    server
        .mock(method, path)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}
