//! HTTP endpoint integration tests
//!
//! Drive the router in-process and assert on the transport contract: both
//! webhook transports, the acknowledgment policy for malformed bodies, and
//! the liveness endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use deskbridge::api::{ApiState, router};
use deskbridge::chatwoot::{
    ChatwootApi, Contact, Conversation, Message, NewContact, NewConversation,
};
use deskbridge::vk::UserDirectory;
use deskbridge::{Result, WebhookDispatcher};
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Records every downstream call and answers with fixed ids
struct RecordingChatwoot {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingChatwoot {
    fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ChatwootApi for RecordingChatwoot {
    async fn search_contact(&self, _identifier: &str) -> Result<Option<Contact>> {
        self.calls.lock().await.push("search_contact");
        Ok(None)
    }

    async fn create_contact(&self, contact: &NewContact) -> Result<Contact> {
        self.calls.lock().await.push("create_contact");
        Ok(Contact {
            id: 101,
            name: Some(contact.name.clone()),
            identifier: Some(contact.identifier.clone()),
            email: Some(contact.email.clone()),
        })
    }

    async fn list_open_conversations(
        &self,
        _inbox_id: i64,
        _contact_id: i64,
    ) -> Result<Vec<Conversation>> {
        self.calls.lock().await.push("list_open_conversations");
        Ok(vec![])
    }

    async fn create_conversation(&self, _conversation: &NewConversation) -> Result<Conversation> {
        self.calls.lock().await.push("create_conversation");
        Ok(Conversation {
            id: 201,
            status: Some("open".to_string()),
        })
    }

    async fn create_message(&self, _conversation_id: i64, _content: &str) -> Result<Message> {
        self.calls.lock().await.push("create_message");
        Ok(Message { id: 301 })
    }
}

/// Directory with a canned name for every user
struct StaticDirectory;

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn display_name(&self, user_id: i64) -> String {
        format!("User {user_id}")
    }
}

/// Build a test router; returns the recording mock for call assertions
fn build_test_router(secret: Option<&str>) -> (axum::Router, Arc<RecordingChatwoot>) {
    let api = Arc::new(RecordingChatwoot::new());

    let dispatcher = WebhookDispatcher::new(
        api.clone(),
        Arc::new(StaticDirectory),
        "bridge-token".to_string(),
        secret.map(str::to_string),
        Some(77),
        5,
    );

    let app = router(Arc::new(ApiState { dispatcher }));
    (app, api)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn confirmation_handshake_over_query_transport() {
    let (app, api) = build_test_router(None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/webhook?type=confirmation&group_id=77")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "bridge-token");
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn query_transport_without_type_is_acknowledged() {
    let (app, api) = build_test_router(None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/webhook?group_id=77")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn query_transport_checks_the_shared_secret() {
    let (app, api) = build_test_router(Some("s3cret"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/webhook?type=message_new&group_id=77&secret=wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn malformed_post_body_is_acknowledged() {
    let (app, api) = build_test_router(None);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn post_message_new_bridges_end_to_end() {
    let (app, api) = build_test_router(Some("s3cret"));

    let envelope = serde_json::json!({
        "type": "message_new",
        "group_id": 77,
        "secret": "s3cret",
        "object": {
            "message": { "from_id": 9000, "text": "hello from vk" }
        }
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("content-type", "application/json")
                .body(Body::from(envelope.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
    assert_eq!(
        api.calls().await,
        vec![
            "search_contact",
            "create_contact",
            "list_open_conversations",
            "create_conversation",
            "create_message",
        ]
    );
}

#[tokio::test]
async fn health_endpoint_reports_service() {
    let (app, _) = build_test_router(None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "deskbridge");
    assert!(json["version"].is_string());
}
