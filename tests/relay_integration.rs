//! End-to-end tests for the WebSocket relay loop.
//!
//! These mount the real router with scripted [`ChatDriver`] implementations,
//! so the full accept → relay → reply path runs without network access.

use std::sync::{Arc, Mutex};

use axum_test::{TestServer, WsMessage};
use axum_ws_relay::config::{AppConfig, ChatConfig, CorsConfig, ServerConfig};
use axum_ws_relay::llm::{ChatDriver, LlmError, Message, MessageRole};
use axum_ws_relay::server::{FALLBACK_REPLY, build_router};
use axum_ws_relay::AppState;

const TEST_PROMPT: &str = "You are a product-support assistant for flow instrumentation.";

/// Driver that records every call and echoes the last user turn.
///
/// Turns whose content is exactly `"boom"` fail with a scripted error.
#[derive(Default)]
struct RecordingDriver {
    calls: Mutex<Vec<Vec<Message>>>,
}

impl RecordingDriver {
    fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatDriver for RecordingDriver {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());

        let last = messages.last().expect("relay never sends an empty context");
        if last.content == "boom" {
            return Err(LlmError::MalformedResponse("scripted failure".to_string()));
        }
        Ok(format!("echo: {}", last.content))
    }
}

fn test_state(driver: Arc<dyn ChatDriver>) -> AppState {
    let config = AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5500".to_string()],
        },
        chat: ChatConfig {
            system_prompt: TEST_PROMPT.to_string(),
        },
    };
    AppState::new(Arc::new(config), driver)
}

fn test_server(driver: Arc<dyn ChatDriver>) -> TestServer {
    let app = build_router(test_state(driver)).expect("router should build");
    TestServer::builder()
        .http_transport()
        .build(app)
        .expect("test server should start")
}

#[tokio::test]
async fn test_seed_invariance_across_connections() {
    let driver = Arc::new(RecordingDriver::default());
    let server = test_server(driver.clone());

    let mut ws_a = server.get_websocket("/ws/chat").await.into_websocket().await;
    let mut ws_b = server.get_websocket("/ws/chat").await.into_websocket().await;

    ws_a.send_text("hello from a").await;
    let _ = ws_a.receive_text().await;
    ws_b.send_text("hello from b").await;
    let _ = ws_b.receive_text().await;

    let calls = driver.calls();
    assert_eq!(calls.len(), 2);
    for call in &calls {
        assert_eq!(call[0].role, MessageRole::System);
        assert_eq!(call[0].content, TEST_PROMPT);
    }
    assert_eq!(calls[0][0], calls[1][0]);
}

#[tokio::test]
async fn test_ordering_one_reply_per_message() {
    let driver = Arc::new(RecordingDriver::default());
    let server = test_server(driver.clone());

    let mut ws = server.get_websocket("/ws/chat").await.into_websocket().await;

    for text in ["first", "second", "third"] {
        ws.send_text(text).await;
    }
    for expected in ["echo: first", "echo: second", "echo: third"] {
        assert_eq!(ws.receive_text().await, expected);
    }
}

#[tokio::test]
async fn test_context_grows_with_each_exchange() {
    let driver = Arc::new(RecordingDriver::default());
    let server = test_server(driver.clone());

    let mut ws = server.get_websocket("/ws/chat").await.into_websocket().await;

    ws.send_text("one").await;
    let _ = ws.receive_text().await;
    ws.send_text("two").await;
    let _ = ws.receive_text().await;

    let calls = driver.calls();
    assert_eq!(calls.len(), 2);
    // system + user
    assert_eq!(calls[0].len(), 2);
    // system + user + assistant + user
    assert_eq!(calls[1].len(), 4);
    assert_eq!(calls[1][2].role, MessageRole::Assistant);
    assert_eq!(calls[1][2].content, "echo: one");
}

#[tokio::test]
async fn test_fallback_on_failure_keeps_connection_open() {
    let driver = Arc::new(RecordingDriver::default());
    let server = test_server(driver.clone());

    let mut ws = server.get_websocket("/ws/chat").await.into_websocket().await;

    ws.send_text("boom").await;
    assert_eq!(ws.receive_text().await, FALLBACK_REPLY);

    // Connection survives; the next message gets a genuine reply.
    ws.send_text("still here?").await;
    assert_eq!(ws.receive_text().await, "echo: still here?");

    // The failed exchange left no trace in the context of the next call.
    let calls = driver.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].iter().all(|m| m.content != "boom"));
    assert_eq!(calls[1].len(), 2);
}

#[tokio::test]
async fn test_disconnect_isolation() {
    let driver = Arc::new(RecordingDriver::default());
    let server = test_server(driver.clone());

    let mut ws_a = server.get_websocket("/ws/chat").await.into_websocket().await;
    let mut ws_b = server.get_websocket("/ws/chat").await.into_websocket().await;

    ws_b.send_text("b before").await;
    assert_eq!(ws_b.receive_text().await, "echo: b before");

    ws_a.send_text("a says hi").await;
    let _ = ws_a.receive_text().await;
    ws_a.close().await;

    // B's session is unaffected by A's close.
    ws_b.send_text("b after").await;
    assert_eq!(ws_b.receive_text().await, "echo: b after");

    let calls = driver.calls();
    let last_b_call = calls.last().unwrap();
    assert_eq!(last_b_call[0].content, TEST_PROMPT);
    assert!(last_b_call.iter().all(|m| !m.content.contains("a says hi")));
}

#[tokio::test]
async fn test_support_scenario_two_messages() {
    let driver = Arc::new(RecordingDriver::default());
    let server = test_server(driver);

    let mut ws = server.get_websocket("/ws/chat").await.into_websocket().await;

    ws.send_text("What flow meters do you offer?").await;
    let first = ws.receive_text().await;
    assert!(!first.is_empty());

    ws.send_text("thanks").await;
    let second = ws.receive_text().await;
    assert!(!second.is_empty());

    assert_eq!(first, "echo: What flow meters do you offer?");
    assert_eq!(second, "echo: thanks");
}

#[tokio::test]
async fn test_binary_frame_is_ignored() {
    let driver = Arc::new(RecordingDriver::default());
    let server = test_server(driver.clone());

    let mut ws = server.get_websocket("/ws/chat").await.into_websocket().await;

    // Binary frames get no reply and leave the session untouched; the next
    // text frame is answered as if the binary frame never arrived.
    ws.send_message(WsMessage::Binary(vec![0x01, 0x02, 0x03].into()))
        .await;
    ws.send_text("after binary").await;
    assert_eq!(ws.receive_text().await, "echo: after binary");

    let calls = driver.calls();
    assert_eq!(calls.len(), 1);
    // system + user only: nothing from the binary frame entered the context.
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[0][1].content, "after binary");
}

#[tokio::test]
async fn test_empty_message_still_gets_one_reply() {
    let driver = Arc::new(RecordingDriver::default());
    let server = test_server(driver);

    let mut ws = server.get_websocket("/ws/chat").await.into_websocket().await;

    // No size or emptiness validation: an empty payload is relayed as-is.
    ws.send_text("").await;
    assert_eq!(ws.receive_text().await, "echo: ");
}
