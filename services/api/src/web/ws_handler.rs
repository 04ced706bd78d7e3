//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! Each connection owns one `SessionCoordinator`; commands that hit external
//! services run in spawned tasks so cancel/reset (and newer submissions) can
//! interleave with work still in flight. After every command and every
//! completion the server pushes a full state snapshot, so a discarded stale
//! result simply re-sends the state that was already current.

use crate::{
    adapters::WsCaptureDevice,
    web::{
        protocol::{ClientMessage, HistoryEntry, ServerMessage, SessionSnapshot},
        state::AppState,
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use idea_polisher_core::session::SessionCoordinator;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    // --- 1. Initialization Phase ---
    let Some(Ok(Message::Text(init_json))) = receiver.next().await else {
        info!("Client disconnected before sending Init message.");
        return;
    };
    let (access_token, mic_access) = match serde_json::from_str::<ClientMessage>(&init_json) {
        Ok(ClientMessage::Init {
            access_token,
            mic_access,
        }) => (access_token, mic_access),
        _ => {
            warn!("First message was not a valid Init message.");
            let _ = send_message(
                &ws_sender,
                &ServerMessage::Error {
                    message: "The first message must be init.".to_string(),
                },
            )
            .await;
            return;
        }
    };

    let user = match &access_token {
        Some(token) => match app_state.auth.current_session(token).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "failed to resolve session token");
                None
            }
        },
        None => None,
    };

    let capture = Arc::new(WsCaptureDevice::new(mic_access));
    let coordinator = SessionCoordinator::new(app_state.session_services(capture.clone()));
    coordinator.initialize(user).await;

    {
        let view = coordinator.view().await;
        let ready = ServerMessage::SessionReady {
            user_email: view.user_email.clone(),
            default_recipient: view.default_recipient.clone(),
        };
        if !send_message(&ws_sender, &ready).await {
            return;
        }
        let _ = send_message(&ws_sender, &ServerMessage::State(SessionSnapshot::from(&view))).await;
        let _ = send_history(&ws_sender, &coordinator).await;
    }

    // --- 2. Main Message Loop ---
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        handle_client_message(client_msg, &coordinator, &ws_sender).await;
                    }
                    Err(e) => {
                        warn!("Failed to deserialize client message: {}", e);
                    }
                }
            }
            Message::Binary(data) => {
                // Microphone frames; dropped unless a recording is live.
                capture.feed(&data);
            }
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    info!("WebSocket connection closed.");
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_client_message(
    client_msg: ClientMessage,
    coordinator: &SessionCoordinator,
    ws_sender: &WsSender,
) {
    match client_msg {
        ClientMessage::Init { .. } => {
            warn!("Received subsequent Init message, which is ignored.");
        }
        ClientMessage::SetNotes { text } => {
            coordinator.set_notes(text).await;
            send_state(ws_sender, coordinator).await;
        }
        ClientMessage::Polish => {
            // Spawned so a cancel or a newer submission can be processed
            // while the polish is in flight.
            spawn_then_push(coordinator, ws_sender, |c| async move { c.polish().await });
            send_state(ws_sender, coordinator).await;
        }
        ClientMessage::StartRecording => {
            coordinator.start_recording().await;
            send_state(ws_sender, coordinator).await;
        }
        ClientMessage::StopRecording => {
            // Spawned: transcription is a long external call.
            spawn_then_push(coordinator, ws_sender, |c| async move {
                c.stop_recording().await
            });
            send_state(ws_sender, coordinator).await;
        }
        ClientMessage::CancelProcessing => {
            coordinator.cancel_processing().await;
            send_state(ws_sender, coordinator).await;
        }
        ClientMessage::Reset => {
            coordinator.reset().await;
            send_state(ws_sender, coordinator).await;
        }
        ClientMessage::Archive => {
            let coordinator = coordinator.clone();
            let ws_sender = ws_sender.clone();
            tokio::spawn(async move {
                if let Some(archive_id) = coordinator.archive().await {
                    let _ = send_message(&ws_sender, &ServerMessage::Archived { archive_id }).await;
                    let _ = send_history(&ws_sender, &coordinator).await;
                }
                send_state(&ws_sender, &coordinator).await;
            });
        }
        ClientMessage::SendEmail {
            recipient,
            save_as_default,
        } => {
            let coordinator = coordinator.clone();
            let ws_sender = ws_sender.clone();
            tokio::spawn(async move {
                if coordinator.send_email(&recipient, save_as_default).await {
                    let _ = send_message(&ws_sender, &ServerMessage::EmailSent).await;
                }
                send_state(&ws_sender, &coordinator).await;
            });
        }
        ClientMessage::LoadHistoryItem { archive_id } => {
            coordinator.load_history_item(&archive_id).await;
            send_state(ws_sender, coordinator).await;
        }
        ClientMessage::RefreshHistory => {
            let coordinator = coordinator.clone();
            let ws_sender = ws_sender.clone();
            tokio::spawn(async move {
                coordinator.refresh_history().await;
                let _ = send_history(&ws_sender, &coordinator).await;
            });
        }
        ClientMessage::DismissError => {
            coordinator.dismiss_error().await;
            send_state(ws_sender, coordinator).await;
        }
    }
}

/// Runs a coordinator operation in a spawned task and pushes a snapshot
/// when it settles.
fn spawn_then_push<F, Fut>(coordinator: &SessionCoordinator, ws_sender: &WsSender, op: F)
where
    F: FnOnce(SessionCoordinator) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let task_coordinator = coordinator.clone();
    let ws_sender = ws_sender.clone();
    tokio::spawn(async move {
        op(task_coordinator.clone()).await;
        send_state(&ws_sender, &task_coordinator).await;
    });
}

async fn send_message(ws_sender: &WsSender, msg: &ServerMessage) -> bool {
    let json = serde_json::to_string(msg).unwrap();
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_ok()
}

async fn send_state(ws_sender: &WsSender, coordinator: &SessionCoordinator) {
    let view = coordinator.view().await;
    let _ = send_message(ws_sender, &ServerMessage::State(SessionSnapshot::from(&view))).await;
}

async fn send_history(ws_sender: &WsSender, coordinator: &SessionCoordinator) -> bool {
    let view = coordinator.view().await;
    let items = view.history.iter().map(HistoryEntry::from).collect();
    send_message(ws_sender, &ServerMessage::History { items }).await
}
