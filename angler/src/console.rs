//! Operator console: lines typed on stdin.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use angler_core::OperatorInput;

/// Forward every line from `input` until it ends or the receiver is
/// dropped.
pub async fn pump<R>(input: R, tx: mpsc::Sender<OperatorInput>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("console closed");
                break;
            }
            Err(e) => {
                warn!("console read error: {e}");
                break;
            }
        };
        let Some(command) = OperatorInput::parse(&line) else {
            continue;
        };
        if tx.send(command).await.is_err() {
            break;
        }
    }
}

/// Spawn a task pumping stdin into a fresh channel.
pub fn spawn_stdin() -> mpsc::Receiver<OperatorInput> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(pump(tokio::io::BufReader::new(tokio::io::stdin()), tx));
    rx
}
