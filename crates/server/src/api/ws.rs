//! WebSocket stream of queue lifecycle events.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use fileforge_core::QueueEvent;

use super::jobs::JobResponse;
use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// WebSocket message sent to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    TaskAdded { job: JobResponse },
    TaskStarted { job: JobResponse },
    TaskCompleted { job: JobResponse },
    TaskFailed { job: JobResponse },
    TaskCancelled { job: JobResponse },
    QueueCleared { cancelled: Vec<String> },
}

impl WsMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            WsMessage::TaskAdded { .. } => "task_added",
            WsMessage::TaskStarted { .. } => "task_started",
            WsMessage::TaskCompleted { .. } => "task_completed",
            WsMessage::TaskFailed { .. } => "task_failed",
            WsMessage::TaskCancelled { .. } => "task_cancelled",
            WsMessage::QueueCleared { .. } => "queue_cleared",
        }
    }
}

impl From<&QueueEvent> for WsMessage {
    fn from(event: &QueueEvent) -> Self {
        match event {
            QueueEvent::TaskAdded { job } => WsMessage::TaskAdded { job: job.into() },
            QueueEvent::TaskStarted { job } => WsMessage::TaskStarted { job: job.into() },
            QueueEvent::TaskCompleted { job } => WsMessage::TaskCompleted { job: job.into() },
            QueueEvent::TaskFailed { job } => WsMessage::TaskFailed { job: job.into() },
            QueueEvent::TaskCancelled { job } => WsMessage::TaskCancelled { job: job.into() },
            QueueEvent::QueueCleared { cancelled } => WsMessage::QueueCleared {
                cancelled: cancelled.clone(),
            },
        }
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.service().queue().subscribe();

    WS_CONNECTIONS_ACTIVE.inc();
    info!("WebSocket client connected");

    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let msg = WsMessage::from(&event);
                    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();

                    match serde_json::to_string(&msg) {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                debug!("WebSocket send failed, client disconnected");
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize WsMessage: {}", e);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} events", n);
                    WS_LAG_EVENTS.inc();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Queue event channel closed");
                    break;
                }
            }
        }
    });

    // Client messages are not part of the protocol; only close matters
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!("Ignoring client message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleared_message_serialization() {
        let msg = WsMessage::from(&QueueEvent::QueueCleared {
            cancelled: vec!["a".into()],
        });
        assert_eq!(msg.kind(), "queue_cleared");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "queue_cleared");
        assert_eq!(json["cancelled"][0], "a");
    }
}
