//! WebSocket transport between a peer and the relay

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::RelayLink;

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Malformed relay message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connect to the relay and bridge the socket to a [`RelayLink`].
///
/// The reader and writer run as background tasks. The link's receiver
/// closes when the socket does.
pub async fn connect(url: &str) -> Result<RelayLink, TransportError> {
    let (socket, _) = connect_async(url).await?;
    info!(url = %url, "Connected to relay");

    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMsg>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerMsg>();

    // Writer: link -> socket
    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let result = match encode(&msg) {
                Ok(frame) => sink.send(frame).await.map_err(TransportError::from),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                debug!(error = %e, "Relay send failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Reader: socket -> link
    tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match decode(&text) {
                    Ok(msg) => {
                        if in_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Skipping relay message"),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Relay connection error");
                    break;
                }
            }
        }
        debug!("Relay reader finished");
    });

    Ok(RelayLink {
        tx: out_tx,
        rx: in_rx,
    })
}

fn encode(msg: &ClientMsg) -> Result<Message, TransportError> {
    Ok(Message::Text(serde_json::to_string(msg)?))
}

fn decode(text: &str) -> Result<ServerMsg, TransportError> {
    Ok(serde_json::from_str(text)?)
}
