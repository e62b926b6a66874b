use super::model::{CommandSpec, SpecOption};
use super::registry::{SpecOrigin, SpecRegistry};
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// Flag spellings accepted in spec files.
static SHORT_FLAG_REGEX: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^-[a-zA-Z0-9]$").unwrap());
static LONG_FLAG_REGEX: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^--[a-zA-Z][a-zA-Z0-9-]*$").unwrap());

/// Loads user-provided `<command>.json` grammar files from spec
/// directories into a registry.
///
/// A broken file is skipped with a warning; a directory that exists but
/// cannot be read is an error, because it means the daemon is not
/// seeing specs the user installed.
pub struct SpecLoader {
    spec_dirs: Vec<PathBuf>,
}

impl SpecLoader {
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { spec_dirs: dirs }
    }

    /// Load every spec file into `registry`, returning how many loaded.
    ///
    /// Names already present in the registry are skipped so user files
    /// cannot shadow built-in grammars registered before the scan.
    pub fn load_into(&self, registry: &mut SpecRegistry) -> Result<usize> {
        let mut loaded = 0;

        for dir in &self.spec_dirs {
            if !dir.exists() {
                debug!("spec directory does not exist: {:?}", dir);
                continue;
            }
            loaded += self.load_from_directory(dir, registry)?;
        }

        debug!("loaded {} spec files", loaded);
        Ok(loaded)
    }

    fn load_from_directory(&self, dir: &Path, registry: &mut SpecRegistry) -> Result<usize> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("failed to read spec directory {dir:?}"))?;

        let mut loaded = 0;
        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read directory entry in {dir:?}"))?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match self.load_spec_file(&path) {
                Ok(spec) => {
                    if registry.contains(&spec.name) {
                        warn!(
                            "skipping {:?}: spec '{}' is already registered",
                            path, spec.name
                        );
                        continue;
                    }
                    debug!("loaded spec '{}' from {:?}", spec.name, path);
                    registry.register(SpecOrigin::Dynamic, spec);
                    loaded += 1;
                }
                Err(e) => {
                    warn!("failed to load spec file {:?}: {:#}", path, e);
                }
            }
        }

        Ok(loaded)
    }

    fn load_spec_file(&self, path: &Path) -> Result<CommandSpec> {
        let content =
            fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;
        let spec: CommandSpec = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON in {path:?}"))?;
        validate_spec(&spec).with_context(|| format!("invalid spec in {path:?}"))?;
        Ok(spec)
    }
}

fn validate_spec(spec: &CommandSpec) -> Result<()> {
    if spec.name.contains(char::is_whitespace) {
        anyhow::bail!("command name cannot contain whitespace: '{}'", spec.name);
    }
    validate_node(spec, &spec.name)
}

fn validate_node(node: &CommandSpec, context: &str) -> Result<()> {
    if node.name.is_empty() {
        anyhow::bail!("empty subcommand name under '{context}'");
    }

    for option in &node.options {
        validate_option(option, context)?;
    }

    for sub in &node.subcommands {
        validate_node(sub, &format!("{context} {}", sub.name))?;
    }

    Ok(())
}

fn validate_option(option: &SpecOption, context: &str) -> Result<()> {
    if option.names.is_empty() {
        anyhow::bail!("option with no names in '{context}'");
    }

    for name in &option.names {
        if !SHORT_FLAG_REGEX.is_match(name) && !LONG_FLAG_REGEX.is_match(name) {
            anyhow::bail!("invalid flag spelling '{name}' in '{context}'");
        }
    }

    Ok(())
}
