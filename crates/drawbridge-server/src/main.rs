//! Drawbridge Command Server
//!
//! Exposes the scene dispatcher over HTTP and WebSocket. Commands from every
//! connection go through one shared dispatcher, one at a time.
//!
//! ## Protocol
//!
//! Requests are JSON objects naming a command and its arguments:
//! ```json
//! { "name": "create_element", "arguments": { "type": "rectangle", "x": 0, "y": 0 } }
//! ```
//! Every request gets exactly one envelope back:
//! ```json
//! { "content": [{ "text": "Created rectangle element ...", "payload": {} }], "isError": false }
//! ```

mod config;
mod converter;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use config::Config;
use converter::ProcessConverter;
use drawbridge_core::{
    CommandError, CommandRequest, DiagramConverter, Dispatcher, Response, ScratchDir,
    UnavailableConverter,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state
struct AppState {
    /// Commands are serialized through this lock.
    dispatcher: Mutex<Dispatcher>,
}

impl AppState {
    fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Mutex::new(dispatcher),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "drawbridge_server=info,drawbridge_core=info,tower_http=info".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let scratch = match &config.scratch_dir {
        Some(path) => ScratchDir::new(path.clone())?,
        None => ScratchDir::default_location()?,
    };
    info!("Scratch directory: {}", scratch.base_path().display());

    let converter: Arc<dyn DiagramConverter> = match config
        .converter
        .as_deref()
        .and_then(|command| ProcessConverter::from_command(command, config.converter_timeout))
    {
        Some(converter) => {
            info!("Diagram converter: {:?}", config.converter);
            Arc::new(converter)
        }
        None => {
            warn!("No diagram converter configured; mermaid import is disabled");
            Arc::new(UnavailableConverter)
        }
    };

    let state = Arc::new(AppState::new(Dispatcher::new(scratch, converter)));
    let app = router(state);

    info!("Drawbridge server listening on {}", config.addr);
    info!("WebSocket endpoint: ws://{}/ws", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/command", post(command_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "Drawbridge Command Server - POST /command or connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// Single command over HTTP
async fn command_handler(State(state): State<Arc<AppState>>, body: String) -> impl IntoResponse {
    let reply = handle_frame(&state, &body).await;
    ([(header::CONTENT_TYPE, "application/json")], reply)
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = handle_frame(&state, text.as_str()).await;
                if sender.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!("Binary frame from {} ignored", peer_id);
                let reply = error_reply(&CommandError::Validation(
                    "binary frames are not supported".to_string(),
                ));
                if sender.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // Ignore ping/pong
            Err(e) => {
                warn!("WebSocket error for {}: {}", peer_id, e);
                break;
            }
        }
    }

    info!("Connection closed: {}", peer_id);
}

/// Decode one request, run it and encode the envelope.
async fn handle_frame(state: &AppState, frame: &str) -> String {
    let request = match serde_json::from_str::<CommandRequest>(frame) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed request: {}", e);
            return error_reply(&CommandError::Validation(format!("malformed request: {}", e)));
        }
    };

    let response = {
        let mut dispatcher = state.dispatcher.lock().await;
        dispatcher.handle(request).await
    };
    encode(&response)
}

fn error_reply(err: &CommandError) -> String {
    encode(&Response::error(err))
}

fn encode(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        warn!("Failed to encode response: {}", e);
        error_reply_fallback()
    })
}

/// Hand-built envelope for when encoding itself fails.
fn error_reply_fallback() -> String {
    r#"{"content":[{"text":"Error: failed to encode response","payload":{"code":"serialization_error"}}],"isError":true}"#
        .to_string()
}
