//! Headless Dash Goal peer
//!
//! Hosts a room when `ROOM_CODE` is unset, otherwise joins it. Key events
//! are read from stdin, one per line: `+w` presses W, `-w` releases it,
//! `+space` / `-space` work the same way. Arrow key names are accepted.
//! End of input leaves the match.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

use dash_goal::config::PeerConfig;
use dash_goal::peer::transport;
use dash_goal::peer::{ClientSession, HostSession, LogRenderer};
use dash_goal::telemetry::init_tracing;
use dash_goal::ws::protocol::InputFlags;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = PeerConfig::from_env()?;
    init_tracing(&config.log_level, false);

    let link = transport::connect(&config.relay_url)
        .await
        .with_context(|| format!("connecting to relay at {}", config.relay_url))?;

    let (input_tx, input_rx) = watch::channel(InputFlags::default());
    tokio::spawn(read_keys(input_tx));

    let end = match config.room_code.clone() {
        None => {
            info!(player_name = %config.player_name, "Hosting a new room");
            let mut session = HostSession::new(link, input_rx, LogRenderer::new(), &config.player_name)
                .with_password(config.room_password.clone())
                .with_duration(config.match_duration_secs);
            session.run().await
        }
        Some(code) => {
            info!(room_code = %code, player_name = %config.player_name, "Joining room");
            let mut session =
                ClientSession::new(link, input_rx, LogRenderer::new(), code, &config.player_name)
                    .with_password(config.room_password.clone());
            session.run().await
        }
    };

    warn!(reason = ?end, "{}", end.notice());
    Ok(())
}

/// Feed stdin key events into the input channel until EOF
async fn read_keys(input_tx: watch::Sender<InputFlags>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut flags = InputFlags::default();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };

        let line = line.trim();
        let (down, key) = if let Some(key) = line.strip_prefix('+') {
            (true, key)
        } else if let Some(key) = line.strip_prefix('-') {
            (false, key)
        } else {
            warn!(line = %line, "Expected +key or -key");
            continue;
        };

        if !flags.apply_key(key, down) {
            warn!(key = %key, "Unbound key");
            continue;
        }
        if input_tx.send(flags).is_err() {
            break;
        }
    }
    // Dropping the sender ends the session
}
