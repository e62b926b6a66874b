use super::matching::rank_and_filter;
use crate::exec::executor::GeneratorExecutor;
use crate::exec::generators;
use crate::spec::model::{ArgSpec, CommandSpec, GeneratorContext, SpecOption};
use crate::spec::registry::SpecRegistry;
use std::collections::HashSet;
use std::path::Path;
use tabd_types::Suggestion;

/// Walks a command grammar against the typed tokens and produces the
/// candidates for the final partial token.
///
/// The walk is fail-open end to end: tokens that match nothing are
/// treated as literal argument values, unknown commands yield zero
/// grammar candidates, and no input is ever an error.
pub struct Resolver<'a> {
    registry: &'a SpecRegistry,
    executor: &'a GeneratorExecutor,
}

/// Option arguments being consumed while walking complete tokens.
struct PendingArgs<'a> {
    args: &'a [ArgSpec],
    index: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a SpecRegistry, executor: &'a GeneratorExecutor) -> Self {
        Self { registry, executor }
    }

    pub async fn resolve(&self, tokens: &[String], cwd: &Path) -> Vec<Suggestion> {
        let Some((first, rest)) = tokens.split_first() else {
            return Vec::new();
        };

        // Still typing the command name itself.
        let Some((partial, complete)) = rest.split_last() else {
            return self.command_name_suggestions(first);
        };

        let Some(spec) = self.registry.get(first) else {
            return Vec::new();
        };

        self.walk(spec, complete, partial, tokens, cwd).await
    }

    /// Known command names matching the typed prefix, case-sensitively.
    fn command_name_suggestions(&self, partial: &str) -> Vec<Suggestion> {
        self.registry
            .command_names()
            .into_iter()
            .filter(|name| name.starts_with(partial))
            .map(|name| {
                let mut suggestion = Suggestion::subcommand(name);
                if let Some(description) = self
                    .registry
                    .get(name)
                    .and_then(|spec| spec.description.as_deref())
                {
                    suggestion = suggestion.with_description(description);
                }
                suggestion
            })
            .collect()
    }

    async fn walk(
        &self,
        spec: &CommandSpec,
        complete: &[String],
        partial: &str,
        tokens: &[String],
        cwd: &Path,
    ) -> Vec<Suggestion> {
        let mut node = spec;
        let mut inherited: Vec<&SpecOption> = Vec::new();
        let mut seen_flags: Vec<&str> = Vec::new();
        let mut arg_cursor = 0usize;
        let mut pending: Option<PendingArgs<'_>> = None;

        let mut i = 0;
        while i < complete.len() {
            let token = complete[i].as_str();

            if let Some(state) = &mut pending {
                let arg = &state.args[state.index];
                if arg.variadic {
                    if token.starts_with('-') {
                        // A flag ends a variadic value list; reprocess it.
                        pending = None;
                    } else {
                        i += 1;
                        continue;
                    }
                } else {
                    state.index += 1;
                    if state.index == state.args.len() {
                        pending = None;
                    }
                    i += 1;
                    continue;
                }
            }

            if token.starts_with('-') {
                seen_flags.push(token);
                if let Some(option) = find_option(node, &inherited, token)
                    && !option.args.is_empty()
                {
                    pending = Some(PendingArgs {
                        args: &option.args,
                        index: 0,
                    });
                }
                i += 1;
                continue;
            }

            if let Some(sub) = node.subcommands.iter().find(|s| s.matches_name(token)) {
                for option in &node.options {
                    if option.persistent {
                        inherited.push(option);
                    }
                }
                node = sub;
                arg_cursor = 0;
                i += 1;
                continue;
            }

            // Unmatched word: a literal value for the next positional.
            if let Some(arg) = node.args.get(arg_cursor)
                && !arg.variadic
            {
                arg_cursor += 1;
            }
            i += 1;
        }

        // An option argument is still being typed.
        if let Some(state) = &pending {
            let arg = &state.args[state.index];
            if arg.variadic && partial.starts_with('-') {
                return self.flag_suggestions(node, &inherited, &seen_flags, partial);
            }
            let candidates = self.arg_candidates(arg, tokens, cwd).await;
            if arg.template.is_some() {
                return candidates;
            }
            return rank_and_filter(candidates, partial);
        }

        if partial.starts_with('-') {
            return self.flag_suggestions(node, &inherited, &seen_flags, partial);
        }

        if !node.subcommands.is_empty() {
            let children = subcommand_suggestions(node);
            if partial.is_empty() {
                return children;
            }
            let ranked = rank_and_filter(children, partial);
            if !ranked.is_empty() || node.args.is_empty() {
                return ranked;
            }
        }

        // Positional argument position. Options stay in the pool so a
        // plain word can still narrow down to a flag by name.
        let mut suggestions = Vec::new();
        let mut has_template = false;
        if let Some(arg) = node.args.get(arg_cursor) {
            has_template = arg.template.is_some();
            suggestions.extend(self.arg_candidates(arg, tokens, cwd).await);
        }
        suggestions.extend(option_suggestions(node, &inherited, &seen_flags, None));

        if has_template {
            // The path routine already filtered by the typed basename.
            return suggestions;
        }
        rank_and_filter(suggestions, partial)
    }

    /// Static values, template listings and generator output for one
    /// argument slot.
    async fn arg_candidates(
        &self,
        arg: &ArgSpec,
        tokens: &[String],
        cwd: &Path,
    ) -> Vec<Suggestion> {
        let mut out: Vec<Suggestion> = arg
            .suggestions
            .iter()
            .map(Suggestion::argument)
            .collect();

        let mut sources = arg.generators.clone();
        if let Some(template) = arg.template {
            sources.push(generators::for_template(template));
        }
        if !sources.is_empty() {
            let context = GeneratorContext::new(tokens.to_vec(), cwd);
            out.extend(self.executor.run_all(&sources, &context).await);
        }

        out
    }

    fn flag_suggestions(
        &self,
        node: &CommandSpec,
        inherited: &[&SpecOption],
        seen_flags: &[&str],
        partial: &str,
    ) -> Vec<Suggestion> {
        let candidates = option_suggestions(node, inherited, seen_flags, Some(partial));
        rank_and_filter(candidates, partial)
    }
}

fn find_option<'a>(
    node: &'a CommandSpec,
    inherited: &[&'a SpecOption],
    token: &str,
) -> Option<&'a SpecOption> {
    node.options
        .iter()
        .find(|option| option.matches_name(token))
        .or_else(|| {
            inherited
                .iter()
                .copied()
                .find(|option| option.matches_name(token))
        })
}

fn subcommand_suggestions(node: &CommandSpec) -> Vec<Suggestion> {
    node.subcommands
        .iter()
        .filter(|sub| !sub.hidden)
        .map(|sub| {
            let mut suggestion = Suggestion::subcommand(&sub.name);
            if let Some(description) = &sub.description {
                suggestion = suggestion.with_description(description);
            }
            if let Some(priority) = sub.priority {
                suggestion = suggestion.with_priority(priority);
            }
            suggestion
        })
        .collect()
}

/// Flags offerable at this node: its own options plus inherited
/// persistent ones, minus hidden entries, spent non-repeatable flags
/// and anything excluded by a flag already on the line.
///
/// `prefix` filters spellings case-sensitively; flags are the one place
/// where `-v` and `-V` must not collapse.
fn option_suggestions(
    node: &CommandSpec,
    inherited: &[&SpecOption],
    seen_flags: &[&str],
    prefix: Option<&str>,
) -> Vec<Suggestion> {
    let pool: Vec<&SpecOption> = node.options.iter().chain(inherited.iter().copied()).collect();

    let excluded: HashSet<&str> = pool
        .iter()
        .filter(|option| option.names.iter().any(|n| seen_flags.contains(&n.as_str())))
        .flat_map(|option| option.exclusive_on.iter().map(String::as_str))
        .collect();

    let mut out = Vec::new();
    for option in pool {
        if option.hidden {
            continue;
        }
        let present = option
            .names
            .iter()
            .any(|n| seen_flags.contains(&n.as_str()));
        if present && !option.repeatable {
            continue;
        }
        if option.names.iter().any(|n| excluded.contains(n.as_str())) {
            continue;
        }

        for name in &option.names {
            if let Some(prefix) = prefix
                && !name.starts_with(prefix)
            {
                continue;
            }
            let mut suggestion = Suggestion::option(name);
            if let Some(description) = &option.description {
                suggestion = suggestion.with_description(description);
            }
            if let Some(priority) = option.priority {
                suggestion = suggestion.with_priority(priority);
            }
            out.push(suggestion);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::runner::MockCommandRunner;
    use crate::spec::model::{Generator, Template};
    use crate::spec::registry::SpecOrigin;
    use std::sync::Arc;
    use tabd_types::SuggestionKind;

    fn test_registry() -> SpecRegistry {
        let git = CommandSpec::new("git")
            .with_description("Version control")
            .with_option(
                SpecOption::new(["-v", "--verbose"])
                    .with_description("Be verbose")
                    .persistent(),
            )
            .with_option(SpecOption::flag("--version"))
            .with_subcommand(
                CommandSpec::new("commit")
                    .with_description("Record changes")
                    .with_option(
                        SpecOption::new(["-m", "--message"])
                            .with_description("Commit message")
                            .with_arg(ArgSpec::new("message")),
                    )
                    .with_option(
                        SpecOption::flag("--amend").exclusive_on(["--squash"]),
                    )
                    .with_option(SpecOption::flag("--squash")),
            )
            .with_subcommand(
                CommandSpec::new("checkout").with_alias("co").with_arg(
                    ArgSpec::new("branch").with_generator(Generator::script("git branch")),
                ),
            )
            .with_subcommand(
                CommandSpec::new("push")
                    .with_arg(ArgSpec::new("remote").with_suggestions(["origin", "upstream"]))
                    .with_arg(ArgSpec::new("branch").with_suggestions(["main", "dev"])),
            )
            .with_subcommand(CommandSpec::new("fsck-objects").hide());

        let run = CommandSpec::new("run")
            .with_option(
                SpecOption::flag("-e")
                    .with_arg(ArgSpec::new("env").variadic())
                    .repeatable(),
            )
            .with_option(SpecOption::flag("--name").with_arg(ArgSpec::new("name")));

        let cd = CommandSpec::new("cd")
            .with_arg(ArgSpec::new("directory").with_template(Template::Folders));

        let mut registry = SpecRegistry::new();
        registry.register(SpecOrigin::Builtin, git);
        registry.register(SpecOrigin::Builtin, run);
        registry.register(SpecOrigin::Builtin, cd);
        registry
    }

    fn executor_with(runner: MockCommandRunner) -> GeneratorExecutor {
        GeneratorExecutor::new(Arc::new(runner))
    }

    async fn resolve_line(registry: &SpecRegistry, executor: &GeneratorExecutor, tokens: &[&str]) -> Vec<Suggestion> {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        Resolver::new(registry, executor)
            .resolve(&tokens, Path::new("/repo"))
            .await
    }

    fn names(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_no_tokens_no_suggestions() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        assert!(resolve_line(&registry, &executor, &[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_command_name_position() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());

        let result = resolve_line(&registry, &executor, &["gi"]).await;
        assert_eq!(names(&result), vec!["git"]);
        assert_eq!(result[0].kind, SuggestionKind::Subcommand);
        assert_eq!(result[0].description.as_deref(), Some("Version control"));

        // Command names filter case-sensitively.
        assert!(resolve_line(&registry, &executor, &["Gi"]).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_mid_line() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        let result = resolve_line(&registry, &executor, &["frobnicate", "--x", ""]).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_all_subcommands_at_word_start() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        let result = resolve_line(&registry, &executor, &["git", ""]).await;

        let listed = names(&result);
        assert_eq!(listed, vec!["commit", "checkout", "push"]);
        assert!(result.iter().all(|s| s.priority == 100));
    }

    #[tokio::test]
    async fn test_partial_subcommand_ranked() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        let result = resolve_line(&registry, &executor, &["git", "co"]).await;
        // Both prefix matches; the shorter name comes out ahead.
        assert_eq!(names(&result), vec!["commit", "checkout"]);
    }

    #[tokio::test]
    async fn test_subcommand_descent_by_alias() {
        let registry = test_registry();
        let executor =
            executor_with(MockCommandRunner::new().respond("git branch", "main\nmaster\ndev"));
        let result = resolve_line(&registry, &executor, &["git", "co", "ma"]).await;
        assert_eq!(names(&result), vec!["main", "master"]);
    }

    #[tokio::test]
    async fn test_flag_listing_includes_persistent_parent_options() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        let result = resolve_line(&registry, &executor, &["git", "commit", "-"]).await;

        let listed = names(&result);
        assert!(listed.contains(&"-m"));
        assert!(listed.contains(&"--message"));
        assert!(listed.contains(&"-v"));
        assert!(listed.contains(&"--verbose"));
        // Non-persistent root options do not flow down.
        assert!(!listed.contains(&"--version"));
    }

    #[tokio::test]
    async fn test_flag_prefix_is_case_sensitive() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        let result = resolve_line(&registry, &executor, &["git", "commit", "--M"]).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_exclusive_and_spent_flags_are_removed() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        let result = resolve_line(&registry, &executor, &["git", "commit", "--amend", "-"]).await;

        let listed = names(&result);
        // --amend was used and is not repeatable; --squash is excluded by it.
        assert!(!listed.contains(&"--amend"));
        assert!(!listed.contains(&"--squash"));
        assert!(listed.contains(&"-m"));
    }

    #[tokio::test]
    async fn test_option_argument_is_consumed() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        let result =
            resolve_line(&registry, &executor, &["git", "commit", "-m", "'fix'", "-"]).await;

        let listed = names(&result);
        assert!(listed.contains(&"--amend"));
        // -m already took its value and is spent.
        assert!(!listed.contains(&"-m"));
        assert!(!listed.contains(&"--message"));
    }

    #[tokio::test]
    async fn test_option_argument_position_offers_nothing_for_free_text() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        let result = resolve_line(&registry, &executor, &["git", "commit", "-m", ""]).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_variadic_option_values_run_to_next_flag() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        let result =
            resolve_line(&registry, &executor, &["run", "-e", "A=1", "B=2", "-"]).await;

        let listed = names(&result);
        assert!(listed.contains(&"--name"));
        // -e is repeatable, so it comes back after its values end.
        assert!(listed.contains(&"-e"));
    }

    #[tokio::test]
    async fn test_positional_cursor_advances() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());

        let first = resolve_line(&registry, &executor, &["git", "push", ""]).await;
        let listed = names(&first);
        assert!(listed.contains(&"origin"));
        assert!(listed.contains(&"upstream"));
        assert!(!listed.contains(&"main"));

        let second = resolve_line(&registry, &executor, &["git", "push", "origin", "ma"]).await;
        assert_eq!(names(&second), vec!["main"]);
    }

    #[tokio::test]
    async fn test_hidden_subcommand_completes_but_is_not_offered() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());

        let offered = resolve_line(&registry, &executor, &["git", ""]).await;
        assert!(!names(&offered).contains(&"fsck-objects"));

        // Typing it still descends into the node without an error.
        let inside = resolve_line(&registry, &executor, &["git", "fsck-objects", "-"]).await;
        assert!(names(&inside).contains(&"-v"));
    }

    #[tokio::test]
    async fn test_path_template_results_are_not_refiltered() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("src")).unwrap();
        std::fs::create_dir(temp_dir.path().join("docs")).unwrap();

        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new());
        let tokens: Vec<String> = vec!["cd".into(), "s".into()];
        let result = Resolver::new(&registry, &executor)
            .resolve(&tokens, temp_dir.path())
            .await;

        assert_eq!(names(&result), vec!["src/"]);
        assert_eq!(result[0].insert_text(), "src/");
        assert_eq!(result[0].kind, SuggestionKind::Folder);
    }

    #[tokio::test]
    async fn test_failed_generator_degrades_to_empty() {
        let registry = test_registry();
        let executor = executor_with(MockCommandRunner::new().fail(
            "git branch",
            "fatal: not a git repository",
            128,
        ));
        let result = resolve_line(&registry, &executor, &["git", "checkout", "ma"]).await;
        assert!(result.is_empty());
    }
}
