use super::socket;
use crate::engine::CompletionEngine;
use crate::engine::history::DEFAULT_POLL_INTERVAL;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use tabd_types::{CompleteRequest, CompleteResponse, EngineError, RequestKind};

/// Unix-socket front of the completion engine.
///
/// The protocol is one JSON object per line in both directions. A
/// malformed line gets an error response on that line; the connection
/// itself stays up until the client goes away.
pub struct DaemonServer {
    engine: Arc<CompletionEngine>,
    socket_path: PathBuf,
}

impl DaemonServer {
    pub fn new(engine: CompletionEngine, socket_path: PathBuf) -> Self {
        DaemonServer {
            engine: Arc::new(engine),
            socket_path,
        }
    }

    pub async fn run(self) -> Result<()> {
        let (listener, guard) = socket::bind(&self.socket_path)
            .with_context(|| format!("failed to bind {}", self.socket_path.display()))?;
        info!("listening on {}", guard.path().display());

        let poller = self.engine.history().spawn_polling(DEFAULT_POLL_INTERVAL);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let signals = shutdown_signal();
        tokio::pin!(signals);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            let engine = Arc::clone(&self.engine);
                            let shutdown = shutdown_tx.clone();
                            tokio::spawn(async move {
                                if let Err(err) = handle_connection(stream, engine, shutdown).await {
                                    debug!("connection closed: {err:#}");
                                }
                            });
                        }
                        Err(err) => warn!("accept failed: {err}"),
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("shutdown requested over socket");
                    break;
                }
                _ = &mut signals => {
                    info!("signal received, shutting down");
                    break;
                }
            }
        }

        poller.abort();
        drop(guard);
        Ok(())
    }
}

async fn handle_connection(
    stream: UnixStream,
    engine: Arc<CompletionEngine>,
    shutdown: watch::Sender<bool>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let (response, stop) = match serde_json::from_str::<CompleteRequest>(&line) {
            Ok(request) => dispatch(&request, &engine).await,
            Err(err) => {
                debug!("malformed request line: {err}");
                let error = EngineError::MalformedRequest(err.to_string());
                (CompleteResponse::err(error.to_string()), false)
            }
        };

        let mut payload = serde_json::to_string(&response)?;
        payload.push('\n');
        writer.write_all(payload.as_bytes()).await?;

        if stop {
            // The response is on the wire before the accept loop stops.
            writer.flush().await?;
            let _ = shutdown.send(true);
            break;
        }
    }
    Ok(())
}

async fn dispatch(
    request: &CompleteRequest,
    engine: &CompletionEngine,
) -> (CompleteResponse, bool) {
    match request.kind {
        RequestKind::Complete => {
            let suggestions = engine.get_completions(request).await;
            (CompleteResponse::ok(suggestions), false)
        }
        RequestKind::Health => (CompleteResponse::ok(Vec::new()), false),
        RequestKind::Shutdown => (CompleteResponse::ok(Vec::new()), true),
        RequestKind::Unknown => (
            CompleteResponse::err(EngineError::UnknownRequestType.to_string()),
            false,
        ),
    }
}

async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate()).ok();
    let terminated = async {
        match terminate.as_mut() {
            Some(sig) => {
                sig.recv().await;
            }
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminated => {}
    }
}
