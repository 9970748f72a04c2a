//! Integration tests for the concierge API.
//!
//! Exercise the full wire contract through the axum router with stub
//! search and generation capabilities and a temporary on-disk store.
//! Each test builds its own independent state.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use concierge_api::handlers::{ChatStartResponse, HealthResponse};
use concierge_api::{create_router, AppState};
use concierge_chat::{TurnPipeline, GENERIC_ERROR_REPLY};
use concierge_core::config::StorageConfig;
use concierge_core::types::RetrievedPassage;
use concierge_generation::{EchoGenerator, FailingGenerator, TextGenerator};
use concierge_retrieval::{DocumentCorpus, Retriever, SimilaritySearch, StaticIndex};
use concierge_storage::ConversationStore;

// =============================================================================
// Helpers
// =============================================================================

struct TestApp {
    _docs: tempfile::TempDir,
    _db: tempfile::TempDir,
    store: Arc<ConversationStore>,
    router: axum::Router,
}

/// Build a router backed by the given corpus documents, index passages,
/// and generator.
fn make_app(
    documents: &[(&str, &str)],
    index_passages: Vec<RetrievedPassage>,
    generator: Arc<dyn TextGenerator>,
) -> TestApp {
    let docs = tempfile::tempdir().unwrap();
    for (name, content) in documents {
        std::fs::write(docs.path().join(name), content).unwrap();
    }

    let db = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        db_path: db.path().join("api.db").to_string_lossy().into_owned(),
        pool_size: 4,
        acquire_timeout_ms: 2_000,
        busy_timeout_ms: 2_000,
    };
    let store = Arc::new(ConversationStore::open(&config).unwrap());

    let corpus = DocumentCorpus::new(docs.path(), vec![".md".to_string()]);
    let index: Arc<dyn SimilaritySearch> = Arc::new(StaticIndex::with_passages(index_passages));
    let retriever = Arc::new(Retriever::new(index, corpus, 2));

    let pipeline = Arc::new(TurnPipeline::new(
        Arc::clone(&store),
        retriever,
        generator,
        Duration::from_secs(5),
    ));

    let router = create_router(AppState::new(Arc::clone(&pipeline)));

    TestApp {
        _docs: docs,
        _db: db,
        store,
        router,
    }
}

fn passage(document: &str, content: &str) -> RetrievedPassage {
    RetrievedPassage {
        document: document.to_string(),
        content: content.to_string(),
        score: 0.1,
    }
}

fn chat_request(json: &str) -> Request<Body> {
    Request::post("/chat/start")
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = make_app(&[], Vec::new(), Arc::new(EchoGenerator));
    let resp = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = body_json(resp).await;
    assert_eq!(health.status, "healthy");
}

// =============================================================================
// Chat wire contract
// =============================================================================

#[tokio::test]
async fn test_chat_with_empty_index_returns_canned_reply() {
    let app = make_app(&[], Vec::new(), Arc::new(EchoGenerator));
    let resp = app
        .router
        .clone()
        .oneshot(chat_request(
            r#"{"phone_number": "+15550100", "question": "Where is the office?"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: ChatStartResponse = body_json(resp).await;
    assert_eq!(body.phone_number, "+15550100");
    assert!(body.message.to_lowercase().contains("no relevant data found"));

    let id = concierge_core::types::ConversationId::new("+15550100").unwrap();
    assert_eq!(app.store.message_count(&id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_chat_with_context_grounds_reply() {
    let app = make_app(
        &[("contact.md", "Call us at 555-0100")],
        vec![passage("contact.md", "Call us at 555-0100")],
        Arc::new(EchoGenerator),
    );
    let resp = app
        .router
        .oneshot(chat_request(
            r#"{"phone_number": "+15550100", "question": "What is your phone number?"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: ChatStartResponse = body_json(resp).await;
    assert!(body.message.contains("555-0100"));
}

#[tokio::test]
async fn test_chat_generation_failure_returns_generic_reply() {
    let app = make_app(
        &[("contact.md", "Call us")],
        vec![passage("contact.md", "Call us")],
        Arc::new(FailingGenerator),
    );
    let resp = app
        .router
        .clone()
        .oneshot(chat_request(
            r#"{"phone_number": "+15550100", "question": "anything"}"#,
        ))
        .await
        .unwrap();

    // The SMS gateway forwards the body verbatim, so failures are 200s
    // with a generic reply, never a raw error payload.
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ChatStartResponse = body_json(resp).await;
    assert_eq!(body.message, GENERIC_ERROR_REPLY);

    // Nothing was committed for the failed turn.
    let id = concierge_core::types::ConversationId::new("+15550100").unwrap();
    assert_eq!(app.store.message_count(&id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_chat_missing_phone_number_is_bad_request() {
    let app = make_app(&[], Vec::new(), Arc::new(EchoGenerator));
    let resp = app
        .router
        .oneshot(chat_request(r#"{"question": "hello"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_blank_phone_number_is_bad_request() {
    let app = make_app(&[], Vec::new(), Arc::new(EchoGenerator));
    let resp = app
        .router
        .oneshot(chat_request(r#"{"phone_number": "  ", "question": "hello"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_missing_question_is_noop_passthrough() {
    let app = make_app(&[], Vec::new(), Arc::new(EchoGenerator));
    let resp = app
        .router
        .clone()
        .oneshot(chat_request(r#"{"phone_number": "+15550100"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: ChatStartResponse = body_json(resp).await;
    assert!(!body.message.is_empty());

    // Nothing stored for an empty question.
    let id = concierge_core::types::ConversationId::new("+15550100").unwrap();
    assert_eq!(app.store.message_count(&id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_chat_memory_spans_requests() {
    let app = make_app(
        &[("tours.md", "Boat tours daily")],
        vec![passage("tours.md", "Boat tours daily")],
        Arc::new(EchoGenerator),
    );

    let resp = app
        .router
        .clone()
        .oneshot(chat_request(
            r#"{"phone_number": "+15550100", "question": "Do you run boat tours?"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .router
        .clone()
        .oneshot(chat_request(
            r#"{"phone_number": "+15550100", "question": "How much do they cost?"}"#,
        ))
        .await
        .unwrap();
    let body: ChatStartResponse = body_json(resp).await;
    // The echoed context proves the first question survived the round trip
    // through the store.
    assert!(body.message.contains("Do you run boat tours?"));
}

#[tokio::test]
async fn test_chat_conversations_are_isolated() {
    let app = make_app(&[], Vec::new(), Arc::new(EchoGenerator));

    for phone in ["+15550100", "+15550199"] {
        let resp = app
            .router
            .clone()
            .oneshot(chat_request(&format!(
                r#"{{"phone_number": "{}", "question": "hello"}}"#,
                phone
            )))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    for phone in ["+15550100", "+15550199"] {
        let id = concierge_core::types::ConversationId::new(phone).unwrap();
        assert_eq!(app.store.message_count(&id).await.unwrap(), 2);
    }
}

#[tokio::test]
async fn test_chat_malformed_json_is_client_error() {
    let app = make_app(&[], Vec::new(), Arc::new(EchoGenerator));
    let resp = app
        .router
        .oneshot(chat_request("{not json"))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}
