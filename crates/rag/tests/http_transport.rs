//! End-to-end tests of `HttpTransport` against a local axum server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use kbsearch_rag::{
    ClientConfig, HttpTransport, RagClient, RagErrorKind, RequestMethod, SearchRequest,
};
use serde_json::Value;
use tokio::net::TcpListener;

/// One request as the server decoded it.
#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    query: HashMap<String, String>,
    body: Option<Value>,
}

struct ServerState {
    /// Scripted replies, served in order; the last one repeats
    responses: Vec<(StatusCode, String)>,
    next: AtomicUsize,
    seen: Mutex<Vec<Seen>>,
}

impl ServerState {
    fn reply(&self, seen: Seen) -> impl IntoResponse {
        self.seen.lock().unwrap().push(seen);
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let (status, body) = self.responses[index.min(self.responses.len() - 1)].clone();
        (status, [(header::CONTENT_TYPE, "application/json")], body)
    }
}

async fn search_post(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.reply(Seen {
        method: "POST",
        query: HashMap::new(),
        body: Some(body),
    })
}

async fn search_get(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.reply(Seen {
        method: "GET",
        query,
        body: None,
    })
}

/// Start a server on a random local port and return its endpoint.
async fn serve(responses: Vec<(u16, String)>) -> (String, Arc<ServerState>) {
    let state = Arc::new(ServerState {
        responses: responses
            .into_iter()
            .map(|(status, body)| (StatusCode::from_u16(status).unwrap(), body))
            .collect(),
        next: AtomicUsize::new(0),
        seen: Mutex::default(),
    });

    let app = Router::new()
        .route("/api/rag", post(search_post).get(search_get))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{}/api/rag", addr), state)
}

fn recorded(state: &ServerState) -> Vec<Seen> {
    state.seen.lock().unwrap().clone()
}

/// Real HTTP client that ignores any proxy settings in the environment.
fn http_client(config: ClientConfig) -> RagClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    RagClient::with_transport(config, Arc::new(HttpTransport::with_client(http))).unwrap()
}

fn ok_body() -> String {
    serde_json::json!({
        "llm_answer": "DexGuru is an analytics platform",
        "sources": [{
            "msg_id": "42",
            "reply_to_msg_id": null,
            "user_name": "alice",
            "msg_date": "2024-05-01T12:00:00Z",
            "msg_text": "DexGuru tracks DEX trades"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let (endpoint, server) = serve(vec![(200, ok_body())]).await;
    let client = http_client(ClientConfig::new(&endpoint, 77).unwrap());

    let response = client
        .search(&SearchRequest::new("What is DexGuru?"))
        .await
        .unwrap();

    assert_eq!(response.llm_answer, "DexGuru is an analytics platform");
    assert_eq!(response.sources[0].user_name, "alice");

    let seen = recorded(&server);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert!(seen[0].query.is_empty());
    assert_eq!(
        seen[0].body,
        Some(serde_json::json!({"query": "What is DexGuru?", "group_id": 77, "max_results": 5}))
    );
}

#[tokio::test]
async fn test_get_sends_query_string() {
    let (endpoint, server) = serve(vec![(200, ok_body())]).await;
    let config = ClientConfig::new(&endpoint, 77)
        .unwrap()
        .with_method(RequestMethod::Get);
    let client = http_client(config);

    client
        .search(&SearchRequest::new("dex guru").with_max_results(3))
        .await
        .unwrap();

    let seen = recorded(&server);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].body, None);
    assert_eq!(seen[0].query["query"], "dex guru");
    assert_eq!(seen[0].query["group_id"], "77");
    assert_eq!(seen[0].query["max_results"], "3");
    assert_eq!(seen[0].query.len(), 3);
}

#[tokio::test]
async fn test_server_error_then_success() {
    let (endpoint, server) = serve(vec![(503, "{}".to_string()), (200, ok_body())]).await;
    let config = ClientConfig::new(&endpoint, 1)
        .unwrap()
        .with_retry_base_delay(Duration::from_millis(10));
    let client = http_client(config);

    let response = client.search(&SearchRequest::new("retry me")).await.unwrap();
    assert_eq!(response.sources.len(), 1);
    assert_eq!(recorded(&server).len(), 2);
}

#[tokio::test]
async fn test_persistent_404_reports_status() {
    let (endpoint, _) = serve(vec![(404, "{}".to_string())]).await;
    let config = ClientConfig::new(&endpoint, 1)
        .unwrap()
        .with_max_retries(2)
        .with_retry_base_delay(Duration::from_millis(10));
    let client = http_client(config);

    let err = client.search(&SearchRequest::new("q")).await.unwrap_err();
    assert_eq!(err.kind(), RagErrorKind::Unavailable);
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("404 Not Found"));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new(&format!("http://{}/rag", addr), 1)
        .unwrap()
        .with_max_retries(2)
        .with_retry_base_delay(Duration::from_millis(5));
    let client = http_client(config);

    let err = client.search(&SearchRequest::new("q")).await.unwrap_err();
    assert_eq!(err.kind(), RagErrorKind::Unavailable);
    assert_eq!(err.root_kind(), RagErrorKind::Network);
    assert_eq!(err.status(), None);
}
