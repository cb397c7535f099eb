// Shared fixtures for API integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;

use spontime::actions::Actions;
use spontime::api::ApiClient;
use spontime::config::Config;
use spontime::notify::RecordingSink;
use spontime::session::{MemoryTokenStore, Session};

pub fn user_json(id: &str, handle: &str) -> Value {
    json!({
        "id": id,
        "handle": handle,
        "display_name": null,
        "email": format!("{}@example.com", handle),
        "phone": null,
        "photo_url": null,
        "language": "en",
        "status": "active",
        "created_at": "2024-05-01T10:00:00Z"
    })
}

pub fn plan_json(id: &str, title: &str, description: Option<&str>) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": description,
        "starts_at": null,
        "ends_at": null,
        "capacity": null,
        "visibility": "public",
        "is_active": true,
        "host_user": user_json("u1", "ada"),
        "created_at": "2024-05-02T09:30:00.000123Z"
    })
}

pub fn auth_json(token: &str) -> Value {
    json!({
        "token": token,
        "user": user_json("u1", "ada"),
        "message": "Login successful"
    })
}

pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::new(base_url);
    config.timeout_seconds = 5;
    config
}

pub fn anonymous_client(base_url: &str) -> ApiClient {
    let session = Arc::new(Session::new(MemoryTokenStore::new()));
    ApiClient::new(&config_for(base_url), session).unwrap()
}

pub fn signed_in_client(base_url: &str, token: &str) -> ApiClient {
    let session = Arc::new(Session::new(MemoryTokenStore::with_token(token)));
    session.set_token(Some(token.to_string()));
    ApiClient::new(&config_for(base_url), session).unwrap()
}

pub fn actions_for(client: ApiClient) -> (Actions, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    (Actions::new(client, sink.clone()), sink)
}

/// A base URL nothing is listening on
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/api/";
