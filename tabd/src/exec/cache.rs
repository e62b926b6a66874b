use crate::spec::model::{CachePolicy, Generator, GeneratorContext};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    identity: String,
    cwd: PathBuf,
    /// Partial token for TTL entries; `None` marks a directory-scoped
    /// entry that lives until the working directory changes.
    token: Option<String>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    suggestions: Arc<Vec<tabd_types::Suggestion>>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Result cache shared by all generators of one executor.
///
/// Keys carry the generator identity, the request working directory and
/// (for TTL entries) the partial token, so results never leak between
/// generators or directories. Two concurrent misses on the same key may
/// both run the generator; the second insert simply wins.
#[derive(Debug, Default)]
pub struct GeneratorCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl GeneratorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        generator: &Generator,
        context: &GeneratorContext,
    ) -> Option<Arc<Vec<tabd_types::Suggestion>>> {
        let key = Self::key_for(generator, context)?;
        let guard = self.entries.read();
        let entry = guard.get(&key)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        debug!("cache hit for generator '{}'", key.identity);
        Some(entry.suggestions.clone())
    }

    pub fn store(
        &self,
        generator: &Generator,
        context: &GeneratorContext,
        suggestions: Vec<tabd_types::Suggestion>,
    ) {
        let Some(key) = Self::key_for(generator, context) else {
            return;
        };

        let expires_at = match generator.cache_policy() {
            CachePolicy::Off => return,
            CachePolicy::Ttl(ms) => Some(Instant::now() + Duration::from_millis(ms)),
            CachePolicy::DirectoryChange => None,
        };

        let mut guard = self.entries.write();
        Self::purge_expired_locked(&mut guard);

        // A directory-scoped generator keeps results for one directory
        // at a time.
        if expires_at.is_none() {
            guard.retain(|k, _| k.token.is_some() || k.identity != key.identity || *k == key);
        }

        debug!(
            "cache store for generator '{}' ({} suggestions)",
            key.identity,
            suggestions.len()
        );
        guard.insert(
            key,
            CacheEntry {
                suggestions: Arc::new(suggestions),
                expires_at,
            },
        );
    }

    fn key_for(generator: &Generator, context: &GeneratorContext) -> Option<CacheKey> {
        let token = match generator.cache_policy() {
            CachePolicy::Off => return None,
            CachePolicy::Ttl(_) => Some(context.current_token().to_string()),
            CachePolicy::DirectoryChange => None,
        };
        Some(CacheKey {
            identity: generator.identity().to_string(),
            cwd: context.cwd.clone(),
            token,
        })
    }

    fn purge_expired_locked(entries: &mut HashMap<CacheKey, CacheEntry>) {
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
