use std::io::ErrorKind;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{debug, warn};

const SOCKET_NAME: &str = "tabd.sock";

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("daemon already running at {0}")]
    AlreadyRunning(PathBuf),
    #[error("{0} exists and is not a socket")]
    NotASocket(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Default socket location: a private directory under `XDG_RUNTIME_DIR`
/// when available, otherwise a per-user path in `/tmp`.
pub fn default_socket_path() -> PathBuf {
    if let Some(runtime_dir) = std::env::var_os("XDG_RUNTIME_DIR") {
        let dir = PathBuf::from(runtime_dir).join("tabd");
        if std::fs::create_dir_all(&dir).is_ok() {
            let _ = std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700));
            return dir.join(SOCKET_NAME);
        }
    }
    // geteuid never fails.
    let uid = unsafe { libc::geteuid() };
    PathBuf::from(format!("/tmp/tabd-{uid}.sock"))
}

/// Removes the socket file when the daemon exits.
#[derive(Debug)]
pub struct SocketGuard {
    path: PathBuf,
}

impl SocketGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SocketGuard {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path)
            && err.kind() != ErrorKind::NotFound
        {
            warn!("failed to remove socket {}: {err}", self.path.display());
        }
    }
}

/// Binds the listener, replacing a stale socket file but refusing to
/// displace a live daemon. The socket itself is chmodded to 0600; only
/// the owning user completes through it.
///
/// Must run inside a tokio runtime.
pub fn bind(path: &Path) -> Result<(UnixListener, SocketGuard), SocketError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    match std::fs::symlink_metadata(path) {
        Ok(meta) => {
            if !meta.file_type().is_socket() {
                return Err(SocketError::NotASocket(path.to_path_buf()));
            }
            // A live daemon accepts the probe; a leftover file from a
            // crashed one refuses it.
            match std::os::unix::net::UnixStream::connect(path) {
                Ok(_) => return Err(SocketError::AlreadyRunning(path.to_path_buf())),
                Err(err)
                    if err.kind() == ErrorKind::ConnectionRefused
                        || err.kind() == ErrorKind::NotFound =>
                {
                    debug!("removing stale socket {}", path.display());
                    std::fs::remove_file(path)?;
                }
                Err(err) => return Err(SocketError::Io(err)),
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(SocketError::Io(err)),
    }

    let listener = UnixListener::bind(path)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok((
        listener,
        SocketGuard {
            path: path.to_path_buf(),
        },
    ))
}
