//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::rooms::{ConnId, RoomError, RoomOptions, DEFAULT_MATCH_DURATION_SECS};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    info!(conn_id = %conn_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();

    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
    state.rooms.register_endpoint(conn_id, outbox_tx);

    run_session(conn_id, &state, ws_sink, ws_stream, outbox_rx).await;

    // Cleanup on disconnect
    state.rooms.disconnect(conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    conn_id: ConnId,
    state: &AppState,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    mut outbox_rx: mpsc::UnboundedReceiver<ServerMsg>,
) {
    let rate_limiter = ConnectionRateLimiter::new();

    // Spawn writer task: outbox -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> registry
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(client_msg) => dispatch(conn_id, state, &rate_limiter, client_msg),
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Failed to parse client message");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(conn_id = %conn_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(conn_id = %conn_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Route one client message through the registry
fn dispatch(conn_id: ConnId, state: &AppState, limiter: &ConnectionRateLimiter, msg: ClientMsg) {
    let rooms = &state.rooms;

    match msg {
        ClientMsg::CreateRoom {
            player_name,
            password,
            duration,
        } => {
            let result = if limiter.check_room_op() {
                let options = RoomOptions {
                    host_name: non_empty(player_name).unwrap_or_else(|| "Host".to_string()),
                    password: password.unwrap_or_default(),
                    duration_secs: duration.unwrap_or(DEFAULT_MATCH_DURATION_SECS),
                };
                rooms.create_room(conn_id, options)
            } else {
                Err(RoomError::RateLimited)
            };

            let reply = match result {
                Ok(code) => ServerMsg::RoomCreated {
                    success: true,
                    room_code: Some(code),
                    error: None,
                },
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Create room rejected");
                    ServerMsg::RoomCreated {
                        success: false,
                        room_code: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            rooms.send(conn_id, reply);
        }

        ClientMsg::JoinRoom {
            room_code,
            player_name,
            password,
        } => {
            let result = if limiter.check_room_op() {
                let name = non_empty(Some(player_name)).unwrap_or_else(|| "Guest".to_string());
                rooms.join_room(conn_id, room_code.trim(), &name, password.as_deref())
            } else {
                Err(RoomError::RateLimited)
            };

            let reply = match result {
                Ok(accepted) => ServerMsg::RoomJoined {
                    success: true,
                    error: None,
                    duration: Some(accepted.duration_secs),
                },
                Err(e) => {
                    warn!(conn_id = %conn_id, room_code = %room_code, error = %e, "Join room rejected");
                    ServerMsg::RoomJoined {
                        success: false,
                        error: Some(e.to_string()),
                        duration: None,
                    }
                }
            };
            rooms.send(conn_id, reply);
        }

        ClientMsg::GetRooms => {
            if !limiter.check_room_op() {
                warn!(conn_id = %conn_id, "Rate limited room listing");
                return;
            }
            rooms.send(
                conn_id,
                ServerMsg::Rooms {
                    rooms: rooms.public_rooms(),
                },
            );
        }

        ClientMsg::SendInput(input) => {
            if !rooms.forward_input(conn_id, input) {
                debug!(conn_id = %conn_id, "Dropped input from endpoint without a host");
            }
        }

        ClientMsg::SendState(snapshot) => {
            if !rooms.forward_state(conn_id, snapshot) {
                debug!(conn_id = %conn_id, "Dropped state from endpoint that hosts no room");
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json)).await.map_err(|e| e.to_string())
}
