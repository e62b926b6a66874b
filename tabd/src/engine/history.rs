use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tabd_history::{HistoryIndex, HistoryStats};
use tabd_types::Suggestion;
use tracing::{debug, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Shared, periodically rebuilt view of the user's shell history.
///
/// Readers take an `Arc` snapshot and never see a half-built index;
/// rebuilds parse the file outside the lock and swap the snapshot in.
pub struct HistoryService {
    path: PathBuf,
    state: RwLock<State>,
}

struct State {
    index: Arc<HistoryIndex>,
    modified: Option<SystemTime>,
}

impl HistoryService {
    /// A service starts with an empty index; call [`refresh`] for the
    /// initial build.
    ///
    /// [`refresh`]: HistoryService::refresh
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(State {
                index: Arc::new(HistoryIndex::default()),
                modified: None,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot. Cheap to clone and safe to hold across awaits.
    pub fn index(&self) -> Arc<HistoryIndex> {
        self.state.read().index.clone()
    }

    /// Rebuilds the index when the file's mtime moved since the last
    /// build. Returns true when a new snapshot was published.
    ///
    /// A missing or unreadable file publishes an empty index; history is
    /// an enrichment and never blocks completion.
    pub fn refresh(&self) -> bool {
        let modified = std::fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok();

        if modified == self.state.read().modified {
            return false;
        }

        let index = match HistoryIndex::from_file(&self.path) {
            Ok(index) => index,
            Err(err) => {
                warn!(
                    "failed to read history file {}: {err:#}",
                    self.path.display()
                );
                HistoryIndex::default()
            }
        };

        let stats = index.stats();
        debug!(
            "history index rebuilt from {}: {} commands, {} prefixes",
            self.path.display(),
            stats.total_commands,
            stats.unique_prefixes,
        );

        let mut state = self.state.write();
        state.index = Arc::new(index);
        state.modified = modified;
        true
    }

    /// Spawns the polling loop that keeps the snapshot current.
    pub fn spawn_polling(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would double up with the initial
            // build done at startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                service.refresh();
            }
        })
    }

    pub fn suggest(&self, input: &str, limit: usize) -> Vec<Suggestion> {
        self.index().suggest(input, limit)
    }

    pub fn boost(&self, prefix: &str) -> i32 {
        self.index().boost(prefix)
    }

    pub fn stats(&self) -> HistoryStats {
        self.index().stats()
    }
}
