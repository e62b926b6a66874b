use crate::daemon::default_socket_path;
use crate::engine::history::DEFAULT_POLL_INTERVAL;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_SOCKET: &str = "TABD_SOCKET";
pub const ENV_HISTORY_FILE: &str = "TABD_HISTORY_FILE";
pub const ENV_SPEC_DIR: &str = "TABD_SPEC_DIR";

/// Effective paths and intervals for one invocation.
///
/// Each value resolves in the same order: explicit flag, environment
/// variable, built-in default. Tilde expansion applies to flag and
/// environment values alike.
#[derive(Debug, Clone)]
pub struct Settings {
    pub socket_path: PathBuf,
    pub history_file: PathBuf,
    pub spec_dirs: Vec<PathBuf>,
    pub history_poll_interval: Duration,
}

impl Settings {
    pub fn resolve(
        socket: Option<String>,
        history_file: Option<String>,
        spec_dir: Option<String>,
    ) -> Self {
        let socket_path = socket
            .as_deref()
            .map(expand)
            .or_else(|| env_path(ENV_SOCKET))
            .unwrap_or_else(default_socket_path);

        let history_file = history_file
            .as_deref()
            .map(expand)
            .or_else(|| env_path(ENV_HISTORY_FILE))
            .unwrap_or_else(default_history_file);

        let spec_dirs = spec_dir
            .as_deref()
            .map(expand)
            .or_else(|| env_path(ENV_SPEC_DIR))
            .map(|dir| vec![dir])
            .unwrap_or_else(default_spec_dirs);

        Settings {
            socket_path,
            history_file,
            spec_dirs,
            history_poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

fn expand(value: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(value).as_ref())
}

fn env_path(name: &str) -> Option<PathBuf> {
    let value = std::env::var(name).ok()?;
    if value.is_empty() {
        return None;
    }
    Some(expand(&value))
}

fn default_history_file() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".zsh_history"))
        .unwrap_or_else(|| PathBuf::from(".zsh_history"))
}

fn default_spec_dirs() -> Vec<PathBuf> {
    dirs::config_dir()
        .map(|config| vec![config.join("tabd").join("specs")])
        .unwrap_or_default()
}
