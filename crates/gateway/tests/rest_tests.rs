//! REST routes against a throwaway SQLite database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use taskdesk_chats::{ConversationService, Coordinator, CoordinatorConfig};
use taskdesk_config::DatabaseConfig;
use taskdesk_database::{initialize_database, SqliteMessageStore, SqliteParticipantDirectory};
use taskdesk_gateway::{create_router, GatewayState, SqliteConversationService};
use tempfile::TempDir;
use tower::ServiceExt;

const MANAGER: &str = "+15551234567";
const EMPLOYEE: &str = "emp_1700000000_ab12cd34";

struct TestApp {
    router: Router,
    conversations: Arc<SqliteConversationService>,
    _db_dir: TempDir,
}

struct TestResponse {
    status: StatusCode,
    json: Value,
}

impl TestApp {
    async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("taskdesk-gateway.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.to_string_lossy()),
            max_connections: 4,
        };
        let pool = initialize_database(&config).await.expect("initialise database");

        let store = Arc::new(SqliteMessageStore::new(pool.clone()));
        let directory = Arc::new(SqliteParticipantDirectory::new(pool));
        let conversations = Arc::new(ConversationService::new(Arc::clone(&store), directory));
        let coordinator = Coordinator::spawn(store, CoordinatorConfig::default());

        let state = GatewayState::new(coordinator, Arc::clone(&conversations));
        Self {
            router: create_router(state),
            conversations,
            _db_dir: db_dir,
        }
    }

    async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("dispatch request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, json }
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new().await;
    let response = app.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["status"], "ok");
    assert!(response.json["timestamp"].is_string());
}

#[tokio::test]
async fn conversations_are_listed_for_both_parties() {
    let app = TestApp::new().await;
    app.conversations
        .open_conversation(MANAGER, EMPLOYEE, Some("Welcome aboard"))
        .await
        .unwrap();

    let response = app
        .get(&format!("/api/chat/conversations?participantId={EMPLOYEE}"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["success"], true);
    let conversations = response.json["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["counterpartId"], MANAGER);
    assert_eq!(conversations[0]["counterpartDisplayName"], "Manager");
    assert_eq!(conversations[0]["lastMessage"]["body"], "Welcome aboard");

    // bare digits are the same manager
    let response = app
        .get("/api/chat/conversations?participantId=15551234567")
        .await;
    let conversations = response.json["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["counterpartId"], EMPLOYEE);
}

#[tokio::test]
async fn missing_participant_is_a_bad_request() {
    let app = TestApp::new().await;
    let response = app.get("/api/chat/conversations").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["success"], false);
    assert!(response.json["error"].as_str().unwrap().contains("participantId"));
}

#[tokio::test]
async fn messages_are_returned_oldest_first() {
    let app = TestApp::new().await;
    let opened = app
        .conversations
        .open_conversation(MANAGER, EMPLOYEE, None)
        .await
        .unwrap();

    let response = app
        .get(&format!("/api/chat/messages/{}", opened.conversation_key))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let messages = response.json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["body"], "Hi!");
    assert_eq!(messages[0]["senderKind"], "manager");
    assert_eq!(messages[0]["read"], false);
}

#[tokio::test]
async fn unknown_conversation_has_no_messages() {
    let app = TestApp::new().await;
    let response = app.get("/api/chat/messages/nobody_here").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["messages"], Value::Array(Vec::new()));
}
