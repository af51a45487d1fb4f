mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use asana_bridge::server::{self, models::AuthorizeResponse};
use asana_bridge::store::{MemoryTokenStore, TokenStore};
use common::{mount_token_endpoint, token_response, StaticVerifier, FRONTEND_URL};

fn verifier() -> StaticVerifier {
    StaticVerifier::default()
        .with_token("token-u1", json!({ "sub": "u1" }))
        .with_token("token-u2", json!({ "user_id": "u2" }))
        .with_token("token-anonymous", json!({ "email": "someone@example.com" }))
}

fn app(server: &MockServer, store: Arc<MemoryTokenStore>) -> Router {
    server::router(common::app_state(&server.uri(), store, verifier()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn mcp_request(token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::HOST, "localhost")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json, text/event-stream");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// The JSON-RPC message in an MCP response, sent either as plain JSON or as
/// the last `data:` event of an SSE stream.
async fn mcp_json(response: axum::response::Response) -> Value {
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    if let Ok(value) = serde_json::from_str(&text) {
        return value;
    }
    text.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .filter_map(|data| serde_json::from_str::<Value>(data.trim()).ok())
        .last()
        .unwrap()
}

/// Runs `POST /asana/authorize` as `token` and returns the minted state.
async fn start_authorization(app: &Router, token: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/asana/authorize")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: AuthorizeResponse = serde_json::from_value(body_json(response).await).unwrap();
    let url = url::Url::parse(&body.authorization_url).unwrap();
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(get("/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_protected_resource_metadata() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(get("/.well-known/oauth-protected-resource"))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["resource"], "https://mcp.example.com/");
    assert_eq!(body["authorization_servers"], json!([server.uri()]));
    assert_eq!(body["scopes_supported"], json!(["openid", "email", "profile"]));
}

#[tokio::test]
async fn test_authorization_server_metadata_is_relayed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": "https://auth.example.com",
            "token_endpoint": "https://auth.example.com/v1/oauth2/token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(get("/.well-known/oauth-authorization-server"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["issuer"], "https://auth.example.com");
}

#[tokio::test]
async fn test_callback_error_redirects_without_storing() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "authorization_code", token_response("a", None), 0).await;
    let store = Arc::new(MemoryTokenStore::new());
    let app = app(&server, store.clone());
    let state = start_authorization(&app, "token-u1").await;

    let response = app
        .oneshot(get(&format!(
            "/asana/callback?error=access_denied&state={}",
            state
        )))
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response),
        format!("{}/?error=access_denied", FRONTEND_URL)
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_callback_stores_under_state_identity() {
    let server = MockServer::start().await;
    mount_token_endpoint(
        &server,
        "authorization_code",
        token_response("u1-access", Some("u1-refresh")),
        1,
    )
    .await;
    let store = Arc::new(MemoryTokenStore::new());
    let app = app(&server, store.clone());
    let state = start_authorization(&app, "token-u1").await;

    // Delivered by a browser with no session at all
    let response = app
        .clone()
        .oneshot(get(&format!(
            "/asana/callback?code=code-123456&state={}",
            state
        )))
        .await
        .unwrap();

    assert_eq!(
        location(&response),
        format!("{}/?asana_connected=true", FRONTEND_URL)
    );
    let record = store.get("u1").await.unwrap().unwrap();
    assert_eq!(record.access_token, "u1-access");
    assert_eq!(record.refresh_token.as_deref(), Some("u1-refresh"));
    assert_eq!(store.get("u2").await.unwrap(), None);

    // The state is spent
    let replay = app
        .oneshot(get(&format!(
            "/asana/callback?code=code-123456&state={}",
            state
        )))
        .await
        .unwrap();
    assert!(location(&replay).contains("error="));
}

#[tokio::test]
async fn test_callback_missing_code() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let response = app(&server, store.clone())
        .oneshot(get("/asana/callback?state=anything"))
        .await
        .unwrap();

    assert_eq!(
        location(&response),
        format!(
            "{}/?error=Missing+code+or+state+parameter",
            FRONTEND_URL
        )
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_callback_rejects_forged_state() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "authorization_code", token_response("a", None), 0).await;
    let store = Arc::new(MemoryTokenStore::new());

    // A raw user id is not a state this server minted
    let response = app(&server, store.clone())
        .oneshot(get("/asana/callback?code=code-123456&state=u1"))
        .await
        .unwrap();

    assert!(location(&response).starts_with(&format!("{}/?error=", FRONTEND_URL)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_callback_exchange_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;
    let store = Arc::new(MemoryTokenStore::new());
    let app = app(&server, store.clone());
    let state = start_authorization(&app, "token-u1").await;

    let response = app
        .oneshot(get(&format!("/asana/callback?code=bad-code&state={}", state)))
        .await
        .unwrap();

    assert_eq!(
        location(&response),
        format!(
            "{}/?error=Failed+to+exchange+authorization+code",
            FRONTEND_URL
        )
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_authorize_requires_bearer() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .method("POST")
        .uri("/asana/authorize")
        .body(Body::empty())
        .unwrap();
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unresolved_identity_is_forbidden() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            Some("token-anonymous"),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_disconnect_removes_credential() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::new());
    store
        .set("u1", common::record("a", "r", Duration::hours(1)))
        .await
        .unwrap();
    store
        .set("u2", common::record("b", "r", Duration::hours(1)))
        .await
        .unwrap();

    let request = Request::builder()
        .method("DELETE")
        .uri("/asana/connection")
        .header(header::AUTHORIZATION, "Bearer token-u1")
        .body(Body::empty())
        .unwrap();
    let response = app(&server, store.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.get("u1").await.unwrap(), None);
    assert!(store.get("u2").await.unwrap().is_some());
}

#[tokio::test]
async fn test_mcp_without_token_is_challenged() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            None,
            json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(challenge.contains(
        "resource_metadata=\"https://mcp.example.com/.well-known/oauth-protected-resource\""
    ));
}

#[tokio::test]
async fn test_mcp_rejects_unknown_token() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            Some("forged"),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mcp_initialize_negotiates_supported_version() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            Some("token-u1"),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "1999-01-01",
                    "capabilities": {},
                    "clientInfo": { "name": "test-client", "version": "1.0.0" }
                }
            }),
        ))
        .await
        .unwrap();

    let body = mcp_json(response).await;
    let version = body["result"]["protocolVersion"].as_str().unwrap();
    assert_ne!(version, "1999-01-01");
    assert_eq!(body["result"]["serverInfo"]["name"], "asana-bridge");
    assert!(body["result"]["capabilities"]["tools"].is_object());
    assert!(body["result"]["capabilities"]["resources"].is_object());
}

#[tokio::test]
async fn test_mcp_lists_tools_with_widget_meta() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            Some("token-u1"),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
        ))
        .await
        .unwrap();

    let body = mcp_json(response).await;
    let tools = body["result"]["tools"].as_array().unwrap();
    let mut names: Vec<&str> = tools
        .iter()
        .filter_map(|tool| tool["name"].as_str())
        .collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "get-task",
            "get-workspaces",
            "list-tasks-due-today",
            "register-auth-code",
            "search-tasks",
            "update-task"
        ]
    );

    let tool = |name: &str| {
        tools
            .iter()
            .find(|tool| tool["name"] == name)
            .cloned()
            .unwrap()
    };
    let due_today = tool("list-tasks-due-today");
    assert_eq!(
        due_today["_meta"]["openai/outputTemplate"],
        "ui://widget/tasks.html"
    );
    assert_eq!(due_today["_meta"]["openai/widgetAccessible"], true);
    assert_eq!(due_today["inputSchema"]["type"], "object");

    let update = tool("update-task");
    assert!(update["_meta"].get("openai/outputTemplate").is_none());
    assert_eq!(update["_meta"]["openai/toolInvocation/invoking"], "Updating task…");
    assert!(tool("get-task").get("_meta").is_none());
}

#[tokio::test]
async fn test_mcp_lists_tasks_widget_resource() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            Some("token-u1"),
            json!({ "jsonrpc": "2.0", "id": 3, "method": "resources/list" }),
        ))
        .await
        .unwrap();

    let body = mcp_json(response).await;
    let resources = body["result"]["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["uri"], "ui://widget/tasks.html");
    assert_eq!(resources[0]["name"], "tasks-widget");
    assert_eq!(resources[0]["mimeType"], "text/html+skybridge");
}

#[tokio::test]
async fn test_mcp_reads_tasks_widget_shell() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            Some("token-u1"),
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "resources/read",
                "params": { "uri": "ui://widget/tasks.html" }
            }),
        ))
        .await
        .unwrap();

    let body = mcp_json(response).await;
    let contents = &body["result"]["contents"][0];
    assert_eq!(contents["uri"], "ui://widget/tasks.html");
    assert_eq!(contents["mimeType"], "text/html+skybridge");
    let html = contents["text"].as_str().unwrap();
    assert!(html.contains(r#"<div id="tasks-root"></div>"#));
    assert!(html.contains(&format!(r#"src="{}/tasks.js""#, FRONTEND_URL)));
    assert!(html.contains(&format!(r#"href="{}/tasks.css""#, FRONTEND_URL)));
    assert_eq!(
        contents["_meta"]["openai/widgetDescription"],
        "Displays Asana tasks that are due today for the selected workspace."
    );
}

#[tokio::test]
async fn test_mcp_unknown_resource_is_protocol_error() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            Some("token-u1"),
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "resources/read",
                "params": { "uri": "ui://widget/projects.html" }
            }),
        ))
        .await
        .unwrap();

    let body = mcp_json(response).await;
    assert_eq!(body["error"]["code"], -32602);
}

#[tokio::test]
async fn test_mcp_notification_accepted() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            Some("token-u1"),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_tool_call_not_connected_is_error_result() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            Some("token-u1"),
            json!({
                "jsonrpc": "2.0",
                "id": 6,
                "method": "tools/call",
                "params": {
                    "name": "list-tasks-due-today",
                    "arguments": { "workspaceGid": "1" }
                }
            }),
        ))
        .await
        .unwrap();

    let body = mcp_json(response).await;
    assert_eq!(body["id"], 6);
    assert_eq!(body["result"]["isError"], true);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("not connected"));
    assert!(text.contains("/asana/authorize"));
}

#[tokio::test]
async fn test_tool_call_uses_callers_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workspaces"))
        .and(wiremock::matchers::header("authorization", "Bearer u2-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "gid": "1", "name": "Acme" }, { "gid": "2", "name": "Home" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store
        .set("u1", common::record("u1-access", "r", Duration::hours(1)))
        .await
        .unwrap();
    store
        .set("u2", common::record("u2-access", "r", Duration::hours(1)))
        .await
        .unwrap();

    let response = app(&server, store)
        .oneshot(mcp_request(
            Some("token-u2"),
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": { "name": "get-workspaces", "arguments": {} }
            }),
        ))
        .await
        .unwrap();

    let body = mcp_json(response).await;
    assert_eq!(body["result"]["isError"], false);
    assert_eq!(
        body["result"]["content"][0]["text"],
        "Found 2 Asana workspaces."
    );
    assert_eq!(body["result"]["structuredContent"]["workspaces"][1]["name"], "Home");
}

#[tokio::test]
async fn test_update_task_text_is_serialized_result() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/tasks/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "gid": "7",
                "name": "Ship it",
                "completed": true,
                "permalink_url": "https://app.asana.com/0/1/7",
                "created_at": "2026-10-01T09:00:00.000Z",
                "modified_at": "2026-10-19T09:00:00.000Z"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store
        .set("u1", common::record("u1-access", "r", Duration::hours(1)))
        .await
        .unwrap();

    let response = app(&server, store)
        .oneshot(mcp_request(
            Some("token-u1"),
            json!({
                "jsonrpc": "2.0",
                "id": 8,
                "method": "tools/call",
                "params": {
                    "name": "update-task",
                    "arguments": { "taskGid": "7", "completed": true }
                }
            }),
        ))
        .await
        .unwrap();

    let body = mcp_json(response).await;
    assert_eq!(body["result"]["isError"], false);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    let parsed: Value = serde_json::from_str(text).unwrap();
    assert_eq!(parsed, body["result"]["structuredContent"]);
    assert_eq!(parsed["task"]["name"], "Ship it");
    assert_eq!(parsed["task"]["completed"], true);
}

#[tokio::test]
async fn test_register_auth_code_validates_length() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "authorization_code", token_response("a", None), 0).await;
    let store = Arc::new(MemoryTokenStore::new());

    let response = app(&server, store.clone())
        .oneshot(mcp_request(
            Some("token-u1"),
            json!({
                "jsonrpc": "2.0",
                "id": 9,
                "method": "tools/call",
                "params": { "name": "register-auth-code", "arguments": { "code": "abc" } }
            }),
        ))
        .await
        .unwrap();

    let body = mcp_json(response).await;
    assert_eq!(body["result"]["isError"], true);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unknown_tool_is_protocol_error() {
    let server = MockServer::start().await;
    let response = app(&server, Arc::new(MemoryTokenStore::new()))
        .oneshot(mcp_request(
            Some("token-u1"),
            json!({
                "jsonrpc": "2.0",
                "id": 10,
                "method": "tools/call",
                "params": { "name": "delete-workspace", "arguments": {} }
            }),
        ))
        .await
        .unwrap();

    let body = mcp_json(response).await;
    assert_eq!(body["error"]["code"], -32602);
}
