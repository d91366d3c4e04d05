//! ChatClient tests against a wiremock server.

use futures::StreamExt;
use intake_api::{ChatClient, Error, HealthStatus, OutboundMessage, StreamRecord};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn collect_records(client: &ChatClient, payload: &OutboundMessage) -> Vec<StreamRecord> {
    let mut stream = client.send_chat_message(payload).await.unwrap();
    let mut records = Vec::new();
    while let Some(item) = stream.next().await {
        records.push(item.unwrap());
    }
    records
}

#[tokio::test]
async fn test_health_healthy_with_descriptors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "healthy",
            "provider": "x",
            "model": "y"
        })))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri()).unwrap();
    let health = client.check_health().await;

    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.provider.as_deref(), Some("x"));
    assert_eq!(health.model.as_deref(), Some("y"));
}

#[tokio::test]
async fn test_health_other_status_is_degraded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "degraded"})),
        )
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri()).unwrap();
    assert_eq!(client.check_health().await.status, HealthStatus::Degraded);
}

#[tokio::test]
async fn test_health_error_status_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri()).unwrap();
    let health = client.check_health().await;
    assert_eq!(health.status, HealthStatus::Unreachable);
    assert_eq!(health.detail.as_deref(), Some("HTTP 500"));
}

#[tokio::test]
async fn test_health_connection_refused_is_unreachable() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = ChatClient::new(uri).unwrap();
    assert_eq!(client.check_health().await.status, HealthStatus::Unreachable);
}

#[tokio::test]
async fn test_chat_stream_decodes_chunks_in_order() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"session_id\":\"s-42\"}\n\n",
        "data: {\"chunk\":\"Hel\"}\n\n",
        "data: {\"chunk\":\"lo\"}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/stream"))
        .and(header("Accept", "text/event-stream"))
        .and(body_json(serde_json::json!({
            "message": "hi",
            "user_id": "u1",
            "language": "en"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri()).unwrap();
    let records = collect_records(&client, &OutboundMessage::new("hi", "u1", "en")).await;

    assert_eq!(
        records,
        vec![
            StreamRecord::SessionAssigned { id: "s-42".into() },
            StreamRecord::chunk("Hel"),
            StreamRecord::chunk("lo"),
        ]
    );
}

#[tokio::test]
async fn test_chat_stream_sends_session_id_when_known() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/stream"))
        .and(body_json(serde_json::json!({
            "message": "next",
            "user_id": "u1",
            "language": "en",
            "session_id": "s-42"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw("", "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri()).unwrap();
    let payload = OutboundMessage::new("next", "u1", "en").with_session(Some("s-42".into()));
    assert!(collect_records(&client, &payload).await.is_empty());
}

#[tokio::test]
async fn test_chat_stream_non_success_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/stream"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri()).unwrap();
    let result = client
        .send_chat_message(&OutboundMessage::new("hi", "u1", "en"))
        .await;

    match result {
        Err(Error::Status { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        Err(other) => panic!("expected status error, got {other}"),
        Ok(_) => panic!("expected status error, got a stream"),
    }
}

#[tokio::test]
async fn test_malformed_payload_is_reported_and_skipped() {
    let server = MockServer::start().await;
    let body = "data: {\"chunk\":\"a\"}\ndata: {broken\ndata: {\"chunk\":\"b\"}\n";
    Mock::given(method("POST"))
        .and(path("/chat/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri()).unwrap();
    let mut diagnostics = client.subscribe_diagnostics();
    let records = collect_records(&client, &OutboundMessage::new("hi", "u1", "en")).await;

    assert_eq!(
        records,
        vec![StreamRecord::chunk("a"), StreamRecord::chunk("b")]
    );
    let diagnostic = diagnostics.try_recv().unwrap();
    assert_eq!(diagnostic.payload, "{broken");
}

#[tokio::test]
async fn test_confirm_business_failure_is_ok() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/confirm"))
        .and(body_json(serde_json::json!({"session_id": "s-1", "user_id": "u1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"success": false, "message": "m"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri()).unwrap();
    let result = client.confirm_schedule("s-1", "u1").await.unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "m");
}

#[tokio::test]
async fn test_confirm_success_carries_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/confirm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "Schedule created",
            "schedule_id": 17,
            "config_id": "cfg-9"
        })))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri()).unwrap();
    let result = client.confirm_schedule("s-1", "u1").await.unwrap();
    assert!(result.success);
    assert_eq!(result.schedule_id, Some(serde_json::json!(17)));
    assert_eq!(result.config_id, Some(serde_json::json!("cfg-9")));
}

#[tokio::test]
async fn test_confirm_server_error_is_err() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/confirm"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri()).unwrap();
    let err = client.confirm_schedule("s-1", "u1").await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
}
