use anyhow::{Context, Result, bail};
use std::path::Path;
use tabd_types::{CompleteRequest, CompleteResponse, RequestKind};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// One-shot exchange with a running daemon: connect, write a single
/// request line, read a single response line.
pub async fn send_request(
    socket_path: &Path,
    request: &CompleteRequest,
) -> Result<CompleteResponse> {
    let stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("no daemon at {}", socket_path.display()))?;
    let (reader, mut writer) = stream.into_split();

    let mut payload = serde_json::to_string(request)?;
    payload.push('\n');
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;

    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line).await?;
    if line.is_empty() {
        bail!("daemon closed the connection before responding");
    }

    serde_json::from_str(&line).with_context(|| format!("malformed response: {}", line.trim()))
}

/// True when a daemon answers a health request on the socket.
pub async fn ping(socket_path: &Path) -> bool {
    send_request(socket_path, &CompleteRequest::control(RequestKind::Health))
        .await
        .map(|response| response.success)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::DaemonServer;
    use crate::engine::CompletionEngine;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_request_without_daemon_fails() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("tabd.sock");

        let result = send_request(
            &socket_path,
            &CompleteRequest::control(RequestKind::Health),
        )
        .await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no daemon at"));
        assert!(!ping(&socket_path).await);
    }

    #[tokio::test]
    async fn test_ping_running_daemon() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("tabd.sock");

        let mut engine = CompletionEngine::new(temp_dir.path().join("history"));
        engine.initialize(Vec::new()).unwrap();
        let handle = tokio::spawn(DaemonServer::new(engine, socket_path.clone()).run());

        for _ in 0..100 {
            if socket_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(ping(&socket_path).await);
        handle.abort();
    }
}
