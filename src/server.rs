//! Axum server and the WebSocket relay loop.
//!
//! One route matters: `GET /ws/chat` upgrades to a WebSocket and runs the
//! relay loop. Each connection owns a fresh [`Session`] seeded with the
//! configured system prompt; every inbound text frame is forwarded to the
//! [`ChatDriver`] with the full turn history, and exactly one text frame is
//! sent back before the next inbound frame is read.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    http::HeaderValue,
    response::Response,
    routing::get,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::session::Session;

/// Fixed reply sent when the remote call fails.
///
/// The only error surface clients ever see: no stack traces, no status
/// codes over the wire.
pub const FALLBACK_REPLY: &str = "Sorry, an error occurred while processing your message.";

/// Build the application router.
///
/// Separated from [`start_server`] so tests can mount the relay with a
/// scripted driver and no listener.
///
/// # Errors
///
/// Returns an error if a configured origin is not a valid header value.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let origins = state
        .config
        .cors
        .allowed_origins
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/ws/chat", get(ws_chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the Axum server with the provided state.
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = build_router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// GET /ws/chat - Upgrade to a WebSocket and run the relay loop.
async fn ws_chat(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Relay loop for one connection.
///
/// Strictly sequential: the handler awaits the inbound frame, awaits the
/// remote reply, sends, then reads the next frame. Pipeline depth one, no
/// reordering. The session lives on this stack and is dropped on every
/// exit path.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut session = Session::new(state.system_prompt.as_ref());

    info!(name: "ws.client.connected", "Client connected");

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!(name: "ws.transport.error", error = %e, "Transport error, closing connection");
                break;
            }
        };

        match msg {
            WsMessage::Text(text) => {
                session.push_user(text.as_str());

                let outbound = match state.driver.complete(session.turns()).await {
                    Ok(reply) => {
                        session.push_assistant(reply.clone());
                        reply
                    }
                    Err(e) => {
                        error!(
                            name: "relay.remote.failed",
                            error = %e,
                            turns = session.len(),
                            "Remote call failed, sending fallback"
                        );
                        // A failed exchange must not pollute later context.
                        session.pop_last_user();
                        FALLBACK_REPLY.to_string()
                    }
                };

                if let Err(e) = socket.send(WsMessage::Text(outbound.into())).await {
                    warn!(name: "ws.send.failed", error = %e, "Failed to send reply, closing connection");
                    break;
                }
            }
            WsMessage::Binary(data) => {
                // Binary frames are out of scope: no reply, no state change.
                debug!(name: "ws.binary.ignored", size = data.len(), "Ignoring binary frame");
            }
            WsMessage::Close(_) => {
                break;
            }
            // Pings are answered by axum at the transport layer.
            WsMessage::Ping(_) | WsMessage::Pong(_) => {}
        }
    }

    info!(
        name: "ws.client.disconnected",
        turns = session.len(),
        "Client disconnected"
    );
    // No explicit close frame on any exit path: dropping the socket closes
    // the transport, and dropping an already-closed socket is a no-op.
}
