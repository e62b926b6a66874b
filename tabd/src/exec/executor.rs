use super::cache::GeneratorCache;
use super::runner::CommandRunner;
use crate::spec::model::{Generator, GeneratorContext};
use std::sync::Arc;
use tabd_types::Suggestion;
use tracing::{debug, warn};

/// Priority for suggestions produced by the default post-processor.
const GENERATOR_PRIORITY: i32 = 75;

/// Runs the generators attached to an argument slot.
///
/// Each generator is independent: one failing, timing out or producing
/// garbage never affects the others, and never surfaces as an error to
/// the caller. The worst outcome of any generator is an empty list.
pub struct GeneratorExecutor {
    runner: Arc<dyn CommandRunner>,
    cache: GeneratorCache,
}

impl GeneratorExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            cache: GeneratorCache::new(),
        }
    }

    /// Run every generator concurrently and concatenate their results.
    pub async fn run_all(
        &self,
        generators: &[Generator],
        context: &GeneratorContext,
    ) -> Vec<Suggestion> {
        let runs = generators
            .iter()
            .map(|generator| self.run_one(generator, context));
        futures::future::join_all(runs)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn run_one(&self, generator: &Generator, context: &GeneratorContext) -> Vec<Suggestion> {
        if let Some(cached) = self.cache.get(generator, context) {
            return cached.as_ref().clone();
        }

        let produced = match generator {
            Generator::Script {
                command,
                post_process,
                ..
            } => {
                let text = command.render(&context.tokens);
                let output = self.runner.run(&text, &context.cwd).await;
                if !output.success() {
                    debug!(
                        "generator '{}' failed (exit {}): {}",
                        generator.identity(),
                        output.exit_code,
                        output.stderr.trim()
                    );
                    // Failures are not cached; the next request retries.
                    return Vec::new();
                }
                match post_process {
                    Some(post) => post(&output.stdout, context),
                    None => default_post_process(&output.stdout),
                }
            }
            Generator::Custom { source, .. } => match source.suggestions(context).await {
                Ok(suggestions) => suggestions,
                Err(e) => {
                    warn!("custom generator '{}' failed: {:#}", source.label(), e);
                    return Vec::new();
                }
            },
        };

        self.cache.store(generator, context, produced.clone());
        produced
    }
}

/// Default stdout handling: one trimmed non-empty line, one suggestion.
pub fn default_post_process(stdout: &str) -> Vec<Suggestion> {
    stdout
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Suggestion::argument(trimmed).with_priority(GENERATOR_PRIORITY))
            }
        })
        .collect()
}
