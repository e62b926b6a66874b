use super::paths::smart_path_suggestions;
use crate::engine::tokenizer::strip_quotes;
use crate::spec::model::{CachePolicy, CustomSource, Generator, GeneratorContext, Template};
use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexSet;
use serde::Deserialize;
use std::sync::Arc;
use tabd_types::Suggestion;
use tracing::debug;

/// Git branches, local and remote.
pub fn git_branches() -> Generator {
    Generator::script(r#"git branch -a --format="%(refname:short)""#)
        .with_post_process(|stdout, _| branch_suggestions(stdout))
}

/// Git tag names.
pub fn git_tags() -> Generator {
    Generator::script("git tag -l").with_post_process(|stdout, _| tag_suggestions(stdout))
}

/// Git remote names, deduplicated across fetch/push lines.
pub fn git_remotes() -> Generator {
    Generator::script("git remote -v").with_post_process(|stdout, _| remote_suggestions(stdout))
}

/// Docker container names, running or not.
pub fn docker_containers() -> Generator {
    Generator::script(r#"docker ps -a --format "{{.Names}}""#).with_post_process(|stdout, _| {
        trimmed_lines(stdout)
            .map(|name| {
                Suggestion::argument(name)
                    .with_description("Docker container")
                    .with_icon("📦")
            })
            .collect()
    })
}

/// Docker image references, skipping dangling `<none>` entries.
pub fn docker_images() -> Generator {
    Generator::script(r#"docker images --format "{{.Repository}}:{{.Tag}}""#).with_post_process(
        |stdout, _| {
            trimmed_lines(stdout)
                .filter(|line| !line.contains("<none>"))
                .map(|image| {
                    Suggestion::argument(image)
                        .with_description("Docker image")
                        .with_icon("🐳")
                })
                .collect()
        },
    )
}

/// Scripts declared in the package.json of the request directory.
pub fn npm_scripts() -> Generator {
    Generator::custom(Arc::new(NpmScriptSource)).with_cache(CachePolicy::Off)
}

/// Installed dependencies from the package.json of the request directory.
pub fn npm_packages() -> Generator {
    Generator::custom(Arc::new(NpmPackageSource)).with_cache(CachePolicy::Off)
}

/// Environment variable names of the daemon process, capped at 50.
pub fn env_vars() -> Generator {
    Generator::custom(Arc::new(EnvVarSource)).with_cache(CachePolicy::Off)
}

/// The shared in-process listing behind an argument's path template.
pub fn for_template(template: Template) -> Generator {
    if template.include_files() {
        files_and_folders()
    } else {
        folders()
    }
}

/// Directory listing for the partial token.
pub fn folders() -> Generator {
    Generator::custom(Arc::new(PathSource {
        label: "smart-folders",
        include_files: false,
    }))
    .with_cache(CachePolicy::Off)
}

/// File and directory listing for the partial token.
pub fn files_and_folders() -> Generator {
    Generator::custom(Arc::new(PathSource {
        label: "smart-files",
        include_files: true,
    }))
    .with_cache(CachePolicy::Off)
}

fn trimmed_lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.lines().map(str::trim).filter(|line| !line.is_empty())
}

fn branch_suggestions(stdout: &str) -> Vec<Suggestion> {
    if stdout.contains("fatal:") {
        return Vec::new();
    }
    trimmed_lines(stdout)
        .map(|branch| {
            let description = if branch.contains("origin/") {
                "Remote branch"
            } else {
                "Local branch"
            };
            Suggestion::argument(branch)
                .with_description(description)
                .with_icon("🌿")
        })
        .collect()
}

fn tag_suggestions(stdout: &str) -> Vec<Suggestion> {
    if stdout.contains("fatal:") {
        return Vec::new();
    }
    trimmed_lines(stdout)
        .map(|tag| {
            Suggestion::argument(tag)
                .with_description("Git tag")
                .with_icon("🏷️")
        })
        .collect()
}

fn remote_suggestions(stdout: &str) -> Vec<Suggestion> {
    if stdout.contains("fatal:") {
        return Vec::new();
    }
    let remotes: IndexSet<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    remotes
        .into_iter()
        .map(|remote| {
            Suggestion::argument(remote)
                .with_description("Git remote")
                .with_icon("🌐")
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    scripts: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    dependencies: std::collections::BTreeMap<String, serde_json::Value>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: std::collections::BTreeMap<String, serde_json::Value>,
}

/// Read and parse package.json from `cwd`. Missing or malformed files
/// mean no suggestions, never an error.
async fn read_manifest(context: &GeneratorContext) -> Option<PackageManifest> {
    let path = context.cwd.join("package.json");
    let content = tokio::fs::read_to_string(&path).await.ok()?;
    match serde_json::from_str(&content) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            debug!("unparseable {:?}: {}", path, e);
            None
        }
    }
}

struct NpmScriptSource;

#[async_trait]
impl CustomSource for NpmScriptSource {
    fn label(&self) -> &str {
        "npm-scripts"
    }

    async fn suggestions(&self, context: &GeneratorContext) -> Result<Vec<Suggestion>> {
        let Some(manifest) = read_manifest(context).await else {
            return Ok(Vec::new());
        };
        Ok(manifest
            .scripts
            .into_iter()
            .map(|(name, cmd)| {
                let description: String = cmd.chars().take(50).collect();
                Suggestion::argument(name)
                    .with_description(description)
                    .with_icon("📜")
            })
            .collect())
    }
}

struct NpmPackageSource;

#[async_trait]
impl CustomSource for NpmPackageSource {
    fn label(&self) -> &str {
        "npm-packages"
    }

    async fn suggestions(&self, context: &GeneratorContext) -> Result<Vec<Suggestion>> {
        let Some(manifest) = read_manifest(context).await else {
            return Ok(Vec::new());
        };
        Ok(manifest
            .dependencies
            .into_keys()
            .chain(manifest.dev_dependencies.into_keys())
            .map(|name| {
                Suggestion::argument(name)
                    .with_description("Installed package")
                    .with_icon("📦")
            })
            .collect())
    }
}

struct EnvVarSource;

#[async_trait]
impl CustomSource for EnvVarSource {
    fn label(&self) -> &str {
        "env-vars"
    }

    async fn suggestions(&self, _context: &GeneratorContext) -> Result<Vec<Suggestion>> {
        let mut names: Vec<String> = std::env::vars()
            .map(|(name, _)| name)
            .filter(|name| !name.is_empty())
            .collect();
        names.sort_unstable();
        names.truncate(50);
        Ok(names
            .into_iter()
            .map(|name| {
                Suggestion::argument(name)
                    .with_description("Environment variable")
                    .with_icon("🔐")
            })
            .collect())
    }
}

struct PathSource {
    label: &'static str,
    include_files: bool,
}

#[async_trait]
impl CustomSource for PathSource {
    fn label(&self) -> &str {
        self.label
    }

    async fn suggestions(&self, context: &GeneratorContext) -> Result<Vec<Suggestion>> {
        let partial = strip_quotes(context.current_token());
        Ok(smart_path_suggestions(
            &context.cwd,
            partial,
            self.include_files,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_branch_suggestions() {
        let output = "main\n  feature/auth\norigin/main\n\n";
        let result = branch_suggestions(output);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].name, "main");
        assert_eq!(result[0].description.as_deref(), Some("Local branch"));
        assert_eq!(result[2].description.as_deref(), Some("Remote branch"));
    }

    #[test]
    fn test_branch_suggestions_outside_repository() {
        assert!(branch_suggestions("fatal: not a git repository").is_empty());
        assert!(tag_suggestions("fatal: not a git repository").is_empty());
    }

    #[test]
    fn test_remote_suggestions_dedupe() {
        let output = "origin\tgit@github.com:x/y (fetch)\norigin\tgit@github.com:x/y (push)\nupstream\tgit@github.com:z/y (fetch)\n";
        let result = remote_suggestions(output);
        let names: Vec<&str> = result.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["origin", "upstream"]);
    }

    #[tokio::test]
    async fn test_npm_scripts_from_manifest() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("package.json"),
            r#"{"scripts": {"build": "tsc -p .", "test": "vitest run"}, "dependencies": {"react": "^18"}}"#,
        )
        .unwrap();
        let ctx = GeneratorContext::new(vec!["npm".into(), "run".into(), "".into()], temp_dir.path());

        let scripts = NpmScriptSource.suggestions(&ctx).await.unwrap();
        let names: Vec<&str> = scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["build", "test"]);
        assert_eq!(scripts[0].description.as_deref(), Some("tsc -p ."));

        let packages = NpmPackageSource.suggestions(&ctx).await.unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "react");
    }

    #[tokio::test]
    async fn test_npm_sources_without_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = GeneratorContext::new(vec!["npm".into(), "run".into(), "".into()], temp_dir.path());
        assert!(NpmScriptSource.suggestions(&ctx).await.unwrap().is_empty());

        fs::write(temp_dir.path().join("package.json"), "{broken").unwrap();
        assert!(NpmPackageSource.suggestions(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_env_vars_are_capped() {
        let ctx = GeneratorContext::new(vec!["export".into(), "".into()], "/");
        let result = EnvVarSource.suggestions(&ctx).await.unwrap();
        assert!(result.len() <= 50);
        assert!(result.iter().all(|s| !s.name.is_empty()));
    }

    #[tokio::test]
    async fn test_path_source_strips_quotes() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("src")).unwrap();
        let source = PathSource {
            label: "smart-folders",
            include_files: false,
        };
        let ctx = GeneratorContext::new(
            vec!["cd".into(), "'sr".into()],
            temp_dir.path(),
        );

        let result = source.suggestions(&ctx).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "src/");
    }

    #[test]
    fn test_catalog_identities_are_distinct() {
        let catalog = [
            git_branches(),
            git_tags(),
            git_remotes(),
            docker_containers(),
            docker_images(),
            npm_scripts(),
            npm_packages(),
            env_vars(),
            folders(),
            files_and_folders(),
        ];
        let identities: IndexSet<String> =
            catalog.iter().map(|g| g.identity().to_string()).collect();
        assert_eq!(identities.len(), catalog.len());
    }
}
