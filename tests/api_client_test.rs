// Integration tests for the API client against a mock server
//
// These tests verify:
// 1. Auth header injection follows the session token
// 2. Status and body mapping into ApiError variants
// 3. Query parameters and request bodies on the wire
// 4. Timeouts and what ends up in the trace log

mod common;

use mockito::Matcher;
use serde_json::json;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use common::{
    anonymous_client, auth_json, config_for, plan_json, signed_in_client, user_json,
    UNREACHABLE_URL,
};
use spontime::api::{
    ApiClient, ApiError, CreatePlanRequest, LoginRequest, RegisterRequest, Visibility,
};
use spontime::errors::suggestion_for;
use spontime::session::{MemoryTokenStore, Session};

/// Log writer that keeps everything in memory
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_anonymous_requests_have_no_authorization_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/plans/")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"count": 0, "next": null, "previous": null, "results": []}).to_string())
        .create_async()
        .await;

    let client = anonymous_client(&server.url());
    let page = client.get_plans(1).await.unwrap();

    assert_eq!(page.count, 0);
    assert!(page.next.is_none());
    assert!(page.results.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_token_is_sent_on_every_call() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let profile = server
        .mock("GET", "/auth/profile/")
        .match_header("authorization", "Token abc123")
        .with_status(200)
        .with_body(user_json("u1", "ada").to_string())
        .create_async()
        .await;
    let users = server
        .mock("GET", "/users/")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .match_header("authorization", "Token abc123")
        .with_status(200)
        .with_body(
            json!({
                "count": 3,
                "next": null,
                "previous": format!("{}/users/?page=1", base),
                "results": [user_json("u3", "grace")]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = signed_in_client(&base, "abc123");

    let user = client.get_profile().await.unwrap();
    assert_eq!(user.handle, "ada");

    let page = client.get_users(2).await.unwrap();
    assert!(page.has_previous());
    assert_eq!(page.results[0].handle, "grace");

    profile.assert_async().await;
    users.assert_async().await;
}

#[tokio::test]
async fn test_login_posts_credentials() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/auth/login/")
        .match_body(Matcher::Json(
            json!({"email": "ada@example.com", "password": "hunter2"}),
        ))
        .with_status(200)
        .with_body(auth_json("tok-1").to_string())
        .create_async()
        .await;

    let client = anonymous_client(&server.url());
    let auth = client
        .login(&LoginRequest::new("ada@example.com", "hunter2"))
        .await
        .unwrap();

    assert_eq!(auth.token, "tok-1");
    assert_eq!(auth.user.id, "u1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_register_sends_display_name_only_when_set() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/auth/register/")
        .match_body(Matcher::Json(json!({
            "email": "ada@example.com",
            "handle": "ada",
            "password": "hunter2",
            "display_name": "Ada L."
        })))
        .with_status(201)
        .with_body(auth_json("tok-2").to_string())
        .create_async()
        .await;

    let client = anonymous_client(&server.url());
    let request =
        RegisterRequest::new("ada@example.com", "ada", "hunter2").with_display_name("Ada L.");
    let auth = client.register(&request).await.unwrap();

    assert_eq!(auth.token, "tok-2");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_is_http_error_not_decode() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/auth/profile/")
        .with_status(401)
        .with_body(r#"{"detail":"Authentication credentials were not provided."}"#)
        .create_async()
        .await;

    let client = anonymous_client(&server.url());
    let err = client.get_profile().await.unwrap_err();

    match &err {
        ApiError::Http { status, body } => {
            assert_eq!(*status, 401);
            assert!(body.contains("credentials"));
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
    assert!(err.is_unauthorized());
    assert_eq!(
        err.server_message().as_deref(),
        Some("Authentication credentials were not provided.")
    );
}

#[tokio::test]
async fn test_error_status_with_non_json_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/plans/missing/")
        .with_status(404)
        .with_body("<h1>Not Found</h1>")
        .create_async()
        .await;

    let client = anonymous_client(&server.url());
    let err = client.get_plan("missing").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.raw_body(), Some("<h1>Not Found</h1>"));
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/plans/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"count": 1, "results": [{"id": "p1""#)
        .create_async()
        .await;

    let client = anonymous_client(&server.url());
    let err = client.get_plans(1).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode { status: 200, .. }));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_empty_success_body_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/auth/profile/")
        .with_status(200)
        .create_async()
        .await;

    let client = anonymous_client(&server.url());
    let err = client.get_profile().await.unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }));
    assert_eq!(err.raw_body(), Some(""));
}

#[tokio::test]
async fn test_wrong_shape_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/users/u1/")
        .with_status(200)
        .with_body(r#"{"id": "u1"}"#)
        .create_async()
        .await;

    let client = anonymous_client(&server.url());
    let err = client.get_user("u1").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let client = anonymous_client(UNREACHABLE_URL);
    let err = client.get_plans(1).await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_empty_title_never_reaches_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/plans/")
        .expect(0)
        .create_async()
        .await;

    let client = signed_in_client(&server.url(), "abc");
    let err = client
        .create_plan(&CreatePlanRequest::new("   "))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_login_fields_never_reach_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/auth/login/")
        .expect(0)
        .create_async()
        .await;

    let client = anonymous_client(&server.url());
    let err = client
        .login(&LoginRequest::new("ada@example.com", ""))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_plan_preserves_title_and_description() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/plans/")
        .match_header("authorization", "Token abc")
        .match_body(Matcher::Json(json!({
            "title": "Sunset picnic",
            "description": "Bring a blanket",
            "capacity": 8,
            "visibility": "friends"
        })))
        .with_status(201)
        .with_body(plan_json("p9", "Sunset picnic", Some("Bring a blanket")).to_string())
        .create_async()
        .await;

    let client = signed_in_client(&server.url(), "abc");
    let request = CreatePlanRequest::new("Sunset picnic")
        .with_description("Bring a blanket")
        .with_capacity(8)
        .with_visibility(Visibility::Friends);

    let plan = client.create_plan(&request).await.unwrap();

    assert_eq!(plan.title, request.title);
    assert_eq!(plan.description, request.description);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_messages_filter_by_plan() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/messages/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("plan_id".into(), "p1".into()),
            Matcher::UrlEncoded("page".into(), "3".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "count": 1,
                "next": null,
                "previous": null,
                "results": [{
                    "id": "m1",
                    "plan": "p1",
                    "user": user_json("u1", "ada"),
                    "content": "On my way",
                    "created_at": "2024-05-03T18:00:00Z"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = signed_in_client(&server.url(), "abc");
    let page = client.get_messages(Some("p1"), 3).await.unwrap();

    assert_eq!(page.results[0].plan_id, "p1");
    assert_eq!(page.results[0].author.as_ref().unwrap().handle, "ada");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_messages_without_filter_omit_plan_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/messages/")
        .match_query(Matcher::Exact("page=1".into()))
        .with_status(200)
        .with_body(json!({"count": 0, "next": null, "previous": null, "results": []}).to_string())
        .create_async()
        .await;

    let client = signed_in_client(&server.url(), "abc");
    let page = client.get_messages(None, 1).await.unwrap();

    assert!(page.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/auth/logout/")
        .with_status(200)
        .with_body(r#"{"message": "Successfully logged out"}"#)
        .create_async()
        .await;

    // No trailing slash on purpose
    let client = signed_in_client(&format!("{}/api", server.url()), "abc");
    let response = client.logout().await.unwrap();

    assert_eq!(response["message"], "Successfully logged out");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_trace_log_never_contains_credentials() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/auth/login/")
        .with_status(200)
        .with_body(auth_json("SECRET-TOKEN-123").to_string())
        .create_async()
        .await;

    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    // Current-thread runtime, so every event from the call lands here
    let _guard = tracing::subscriber::set_default(subscriber);

    let client = anonymous_client(&server.url());
    let auth = client
        .login(&LoginRequest::new("ada@example.com", "hunter2"))
        .await
        .unwrap();
    assert_eq!(auth.token, "SECRET-TOKEN-123");

    let output = log.contents();
    assert!(output.contains("Response body"));
    assert!(!output.contains("SECRET-TOKEN-123"));
    assert!(!output.contains("hunter2"));
}

#[tokio::test]
async fn test_silent_server_times_out() {
    // Accepts connections and never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let mut config = config_for(&format!("http://{}/api/", addr));
    config.timeout_seconds = 1;
    let session = Arc::new(Session::new(MemoryTokenStore::new()));
    let client = ApiClient::new(&config, session).unwrap();

    let started = Instant::now();
    let err = client.get_plans(1).await.unwrap_err();

    assert!(err.is_transport());
    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(suggestion_for(&err).unwrap().contains("timeout_seconds"));
}
