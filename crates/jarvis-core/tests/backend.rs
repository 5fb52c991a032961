use std::sync::Arc;
use std::time::Duration;

use jarvis_core::{
    BackendClient, BackendError, ChatMessage, ChatRole, ConnectionStatus, ConnectivityMonitor,
    NoticeKind, Session,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_probe(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "status": "Jarvis is online" })))
        .mount(server)
        .await;
}

/// A base URL nothing is listening on
async fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn chat_success_appends_user_then_assistant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({ "message": "Hi" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Hello" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri());
    let mut session = Session::new(client.base_url());
    let before = session.messages().len();

    session.send(&client, "Hi").await;

    assert_eq!(session.messages().len(), before + 2);
    let tail = &session.messages()[before..];
    assert_eq!(tail, &[ChatMessage::user("Hi"), ChatMessage::assistant("Hello")]);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn chat_error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "db down" })))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri());
    let mut session = Session::new(client.base_url());

    session.send(&client, "ping").await;

    assert_eq!(session.messages().len(), 3);
    let last = session.conversation().last().unwrap();
    assert_eq!(last.role, ChatRole::Assistant);
    assert!(last.content.contains("db down"));
    assert!(!session.is_loading());
}

#[tokio::test]
async fn chat_error_without_detail_reads_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri());
    let mut session = Session::new(client.base_url());

    session.send(&client, "ping").await;

    assert_eq!(session.messages().len(), 3);
    let last = session.conversation().last().unwrap();
    assert_eq!(
        last.content,
        format!(
            "⚠️ **System Alert**: Network Error: Ensure backend is reachable at {}.",
            server.uri()
        )
    );
    assert!(!session.is_loading());
}

#[tokio::test]
async fn chat_client_reports_structured_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{ "loc": ["body", "message"], "msg": "field required" }]
        })))
        .mount(&server)
        .await;

    let err = BackendClient::new(&server.uri()).chat("x").await.unwrap_err();
    match err {
        BackendError::Api { status, detail } => {
            assert_eq!(status.as_u16(), 422);
            assert!(detail.unwrap().contains("field required"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_network_failure_becomes_alert() {
    let url = dead_url().await;
    let client = BackendClient::new(&url);
    let mut session = Session::new(client.base_url());

    session.send(&client, "anyone there?").await;

    assert_eq!(session.messages().len(), 3);
    assert_eq!(session.messages()[1], ChatMessage::user("anyone there?"));
    let last = session.conversation().last().unwrap();
    assert!(last.content.starts_with("⚠️ **System Alert**: Network Error"));
    assert!(last.content.contains(&url));
}

#[tokio::test]
async fn blank_send_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "?" })))
        .expect(0)
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri());
    let mut session = Session::new(client.base_url());
    session.send(&client, "   \n ").await;

    assert_eq!(session.messages().len(), 1);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn ingest_success_clears_draft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ingest"))
        .and(body_json(json!({ "text": "fact" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "success", "message": "Ingested 1 chunks" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri());
    let mut session = Session::new(client.base_url());
    session.ingest_draft = "fact".to_string();
    let text = session.ingest_draft.clone();

    session.ingest(&client, &text).await;

    assert!(session.ingest_draft.is_empty());
    assert!(!session.is_ingesting());
    assert_eq!(session.notice().unwrap().kind, NoticeKind::Success);
}

#[tokio::test]
async fn ingest_network_failure_keeps_draft() {
    let client = BackendClient::new(&dead_url().await);
    let mut session = Session::new(client.base_url());
    session.ingest_draft = "fact".to_string();
    let text = session.ingest_draft.clone();

    session.ingest(&client, &text).await;

    assert_eq!(session.ingest_draft, "fact");
    assert!(!session.is_ingesting());
    let notice = session.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Failure);
    assert!(notice.text.starts_with("Failed to ingest data: "));
    assert_eq!(session.messages().len(), 1);
}

#[tokio::test]
async fn probe_sequence_tracks_backend() {
    let server = MockServer::start().await;
    let monitor = ConnectivityMonitor::new(BackendClient::new(&server.uri()));
    let mut observed = Vec::new();

    mount_probe(&server, 200).await;
    observed.push(monitor.check().await);

    server.reset().await;
    mount_probe(&server, 503).await;
    observed.push(monitor.check().await);

    server.reset().await;
    mount_probe(&server, 200).await;
    observed.push(monitor.check().await);

    assert_eq!(
        observed,
        vec![ConnectionStatus::Online, ConnectionStatus::Offline, ConnectionStatus::Online]
    );
}

#[tokio::test]
async fn manual_recheck_is_idempotent() {
    let server = MockServer::start().await;
    mount_probe(&server, 200).await;
    let monitor = ConnectivityMonitor::new(BackendClient::new(&server.uri()));

    for _ in 0..3 {
        assert_eq!(monitor.check().await, ConnectionStatus::Online);
    }
}

#[tokio::test]
async fn spawned_monitor_publishes_and_stops_on_drop() {
    let server = MockServer::start().await;
    mount_probe(&server, 200).await;

    let monitor = Arc::new(ConnectivityMonitor::new(BackendClient::new(&server.uri())));
    let mut status = monitor.subscribe();
    let handle = monitor.clone().spawn(Duration::from_millis(50));

    tokio::time::timeout(Duration::from_secs(5), status.wait_for(|s| s.is_online()))
        .await
        .expect("monitor never reported online")
        .unwrap();

    server.reset().await;
    mount_probe(&server, 500).await;
    tokio::time::timeout(
        Duration::from_secs(5),
        status.wait_for(|s| *s == ConnectionStatus::Offline),
    )
    .await
    .expect("monitor never reported offline")
    .unwrap();

    drop(handle);
    server.reset().await;
    mount_probe(&server, 200).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(monitor.status(), ConnectionStatus::Offline);
}
