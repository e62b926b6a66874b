pub mod history;
pub mod matching;
pub mod ranker;
pub mod resolver;
pub mod tokenizer;

use crate::exec::executor::GeneratorExecutor;
use crate::exec::runner::TokioCommandRunner;
use crate::spec::loader::SpecLoader;
use crate::spec::registry::{SpecCount, SpecRegistry};
use anyhow::Result;
use history::HistoryService;
use resolver::Resolver;
use std::path::PathBuf;
use std::sync::Arc;
use tabd_types::{CompleteRequest, EngineError, Suggestion};
use tracing::{debug, info};

/// The completion pipeline behind both the daemon and the one-shot CLI:
/// tokenize the line up to the cursor, walk the command grammar, blend in
/// history, rank and cap.
pub struct CompletionEngine {
    registry: SpecRegistry,
    executor: GeneratorExecutor,
    history: Arc<HistoryService>,
}

impl CompletionEngine {
    pub fn new(history_file: impl Into<PathBuf>) -> Self {
        CompletionEngine {
            registry: SpecRegistry::new(),
            executor: GeneratorExecutor::new(Arc::new(TokioCommandRunner::default())),
            history: Arc::new(HistoryService::new(history_file)),
        }
    }

    /// Registers the builtin specs, loads user spec files and builds the
    /// initial history index.
    ///
    /// An unreadable spec directory is the one fatal condition here; a
    /// missing history file just leaves history empty.
    pub fn initialize(&mut self, spec_dirs: Vec<PathBuf>) -> Result<()> {
        crate::spec::builtin::register_builtins(&mut self.registry);
        SpecLoader::with_dirs(spec_dirs)
            .load_into(&mut self.registry)
            .map_err(|err| EngineError::SpecLoad(format!("{err:#}")))?;

        let count = self.registry.count();
        info!(
            "completion specs ready: {} builtin, {} from spec files",
            count.builtin, count.dynamic
        );

        self.history.refresh();
        Ok(())
    }

    /// Answers one completion request. Internal failures degrade to fewer
    /// suggestions, never to an error.
    pub async fn get_completions(&self, request: &CompleteRequest) -> Vec<Suggestion> {
        let input = tokenizer::slice_to_cursor(&request.command_line, request.cursor_position);
        let tokens = tokenizer::tokenize(input);
        if tokens.is_empty() {
            return Vec::new();
        }

        let cwd = request_cwd(&request.cwd);
        let index = self.history.index();

        let history = ranker::history_candidates(&index, &tokens);
        let grammar = Resolver::new(&self.registry, &self.executor)
            .resolve(&tokens, &cwd)
            .await;

        let merged = ranker::merge(history, grammar, &index, &tokens);
        debug!(
            "completed {:?} (cursor {}): {} suggestions",
            request.command_line,
            request.cursor_position,
            merged.len()
        );
        merged
    }

    pub fn spec_count(&self) -> SpecCount {
        self.registry.count()
    }

    /// Shared history service, for the daemon's polling task.
    pub fn history(&self) -> &Arc<HistoryService> {
        &self.history
    }
}

fn request_cwd(cwd: &str) -> PathBuf {
    if cwd.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    }
    PathBuf::from(shellexpand::tilde(cwd).as_ref())
}
