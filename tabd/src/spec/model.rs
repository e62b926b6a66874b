use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tabd_types::Suggestion;

/// Default generator cache lifetime in milliseconds.
pub const DEFAULT_CACHE_TTL_MS: u64 = 5000;

/// Declarative completion grammar for one command.
///
/// The same shape describes the root command and every subcommand below
/// it, so the resolver walks the tree with a single routine.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    /// Command or subcommand name.
    pub name: String,
    /// Alternate spellings accepted in the subcommand position.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Nested subcommands, matched by name or alias.
    #[serde(default)]
    pub subcommands: Vec<CommandSpec>,
    /// Flags accepted at this node.
    #[serde(default)]
    pub options: Vec<SpecOption>,
    /// Positional arguments in declaration order.
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    /// Hidden entries still parse but are never offered.
    #[serde(default)]
    pub hidden: bool,
    /// Display priority, defaulting to 100 for subcommands.
    #[serde(default)]
    pub priority: Option<i32>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            subcommands: Vec::new(),
            options: Vec::new(),
            args: Vec::new(),
            hidden: false,
            priority: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_subcommand(mut self, subcommand: CommandSpec) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    pub fn with_option(mut self, option: SpecOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn hide(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// True when `token` names this spec directly or via an alias.
    pub fn matches_name(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|alias| alias == token)
    }
}

/// A flag together with all of its accepted spellings.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecOption {
    /// Every spelling, e.g. `["-m", "--message"]`. Each one is offered
    /// as its own suggestion.
    pub names: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Arguments the flag consumes from the tokens after itself.
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    /// May appear more than once on the same line.
    #[serde(default)]
    pub repeatable: bool,
    /// Offered at this node and every subcommand depth below it.
    #[serde(default)]
    pub persistent: bool,
    /// Flag names removed from the offer once this one is present.
    #[serde(default)]
    pub exclusive_on: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
    /// Display priority, defaulting to 80 for options.
    #[serde(default)]
    pub priority: Option<i32>,
}

impl SpecOption {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            description: None,
            args: Vec::new(),
            repeatable: false,
            persistent: false,
            exclusive_on: Vec::new(),
            hidden: false,
            priority: None,
        }
    }

    /// A flag with a single spelling.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new([name.into()])
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn exclusive_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusive_on = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn hide(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn matches_name(&self, token: &str) -> bool {
        self.names.iter().any(|name| name == token)
    }

    /// True when the flag consumes at least one following token.
    pub fn takes_value(&self) -> bool {
        !self.args.is_empty()
    }
}

/// A positional argument slot.
#[derive(Debug, Clone, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// May be skipped without consuming a token.
    #[serde(default)]
    pub optional: bool,
    /// Consumes every remaining token.
    #[serde(default)]
    pub variadic: bool,
    /// Fixed candidate values.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Filesystem listing resolved in-process.
    #[serde(default)]
    pub template: Option<Template>,
    /// Dynamic candidate sources.
    #[serde(default)]
    pub generators: Vec<Generator>,
    /// Value assumed when the argument is omitted.
    #[serde(default)]
    pub default: Option<String>,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            optional: false,
            variadic: false,
            suggestions: Vec::new(),
            template: None,
            generators: Vec::new(),
            default: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_generator(mut self, generator: Generator) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Filesystem completion templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    /// Files and directories.
    Filepaths,
    /// Directories only.
    Folders,
    /// Files, plus the directories leading to them.
    Files,
}

impl Template {
    pub fn include_files(self) -> bool {
        !matches!(self, Template::Folders)
    }
}

/// Cache behavior for one generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Run on every request.
    Off,
    /// Reuse results for the given number of milliseconds.
    Ttl(u64),
    /// Reuse results until the request working directory changes.
    DirectoryChange,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Ttl(DEFAULT_CACHE_TTL_MS)
    }
}

/// Request state handed to generators when they run.
#[derive(Debug, Clone)]
pub struct GeneratorContext {
    /// Tokens of the sliced command line. The last one is the partial
    /// token under the cursor, possibly empty.
    pub tokens: Vec<String>,
    /// Working directory of the requesting shell.
    pub cwd: PathBuf,
}

impl GeneratorContext {
    pub fn new(tokens: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            tokens,
            cwd: cwd.into(),
        }
    }

    /// The partial token under the cursor, empty at a word start.
    pub fn current_token(&self) -> &str {
        self.tokens.last().map(String::as_str).unwrap_or("")
    }
}

/// Shell command text run by a script generator.
#[derive(Clone)]
pub enum ScriptCommand {
    /// Fixed command text.
    Literal(String),
    /// Command rendered from the request tokens.
    FromTokens {
        /// Stable identity for cache keys, since the rendered text varies.
        label: String,
        render: Arc<dyn Fn(&[String]) -> String + Send + Sync>,
    },
}

impl ScriptCommand {
    pub fn render(&self, tokens: &[String]) -> String {
        match self {
            ScriptCommand::Literal(text) => text.clone(),
            ScriptCommand::FromTokens { render, .. } => render(tokens),
        }
    }

    pub fn identity(&self) -> &str {
        match self {
            ScriptCommand::Literal(text) => text,
            ScriptCommand::FromTokens { label, .. } => label,
        }
    }
}

impl fmt::Debug for ScriptCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptCommand::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            ScriptCommand::FromTokens { label, .. } => f
                .debug_struct("FromTokens")
                .field("label", label)
                .finish_non_exhaustive(),
        }
    }
}

/// Turns raw script output into suggestions.
pub type PostProcess = Arc<dyn Fn(&str, &GeneratorContext) -> Vec<Suggestion> + Send + Sync>;

/// In-process async candidate source. Only constructible in code, never
/// from JSON.
#[async_trait]
pub trait CustomSource: Send + Sync {
    /// Stable identity for cache keys.
    fn label(&self) -> &str;

    async fn suggestions(&self, context: &GeneratorContext) -> Result<Vec<Suggestion>>;
}

/// Dynamic candidate source attached to an argument slot.
#[derive(Clone)]
pub enum Generator {
    /// External command run through the shell, stdout post-processed
    /// into suggestions.
    Script {
        command: ScriptCommand,
        post_process: Option<PostProcess>,
        cache: CachePolicy,
    },
    /// In-process source.
    Custom {
        source: Arc<dyn CustomSource>,
        cache: CachePolicy,
    },
}

impl Generator {
    /// Script generator with fixed command text and default caching.
    pub fn script(command: impl Into<String>) -> Self {
        Generator::Script {
            command: ScriptCommand::Literal(command.into()),
            post_process: None,
            cache: CachePolicy::default(),
        }
    }

    /// Script generator whose command text is rendered from the tokens.
    pub fn script_from_tokens<F>(label: impl Into<String>, render: F) -> Self
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        Generator::Script {
            command: ScriptCommand::FromTokens {
                label: label.into(),
                render: Arc::new(render),
            },
            post_process: None,
            cache: CachePolicy::default(),
        }
    }

    pub fn custom(source: Arc<dyn CustomSource>) -> Self {
        Generator::Custom {
            source,
            cache: CachePolicy::default(),
        }
    }

    /// Attach a post-processor. No effect on custom generators, which
    /// produce suggestions directly.
    pub fn with_post_process<F>(mut self, post: F) -> Self
    where
        F: Fn(&str, &GeneratorContext) -> Vec<Suggestion> + Send + Sync + 'static,
    {
        if let Generator::Script { post_process, .. } = &mut self {
            *post_process = Some(Arc::new(post));
        }
        self
    }

    pub fn with_cache(mut self, policy: CachePolicy) -> Self {
        match &mut self {
            Generator::Script { cache, .. } | Generator::Custom { cache, .. } => *cache = policy,
        }
        self
    }

    pub fn cache_policy(&self) -> CachePolicy {
        match self {
            Generator::Script { cache, .. } | Generator::Custom { cache, .. } => *cache,
        }
    }

    /// Identity used to key cache entries for this generator.
    pub fn identity(&self) -> &str {
        match self {
            Generator::Script { command, .. } => command.identity(),
            Generator::Custom { source, .. } => source.label(),
        }
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generator::Script { command, cache, .. } => f
                .debug_struct("Script")
                .field("command", command)
                .field("cache", cache)
                .finish_non_exhaustive(),
            Generator::Custom { source, cache } => f
                .debug_struct("Custom")
                .field("label", &source.label())
                .field("cache", cache)
                .finish(),
        }
    }
}

// JSON spec files can only express script generators with literal
// command text. Custom sources and token-derived scripts are built in
// code by the built-in library.
impl<'de> Deserialize<'de> for Generator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ScriptShape {
            command: String,
            #[serde(default)]
            cache: Option<CacheShape>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum CacheShape {
            Enabled(bool),
            Policy {
                #[serde(default)]
                ttl: Option<u64>,
                #[serde(default)]
                strategy: Option<String>,
            },
        }

        let shape = ScriptShape::deserialize(deserializer)?;
        let cache = match shape.cache {
            None => CachePolicy::default(),
            Some(CacheShape::Enabled(true)) => CachePolicy::default(),
            Some(CacheShape::Enabled(false)) => CachePolicy::Off,
            Some(CacheShape::Policy { strategy, ttl }) => match strategy.as_deref() {
                Some("directory") => CachePolicy::DirectoryChange,
                _ => CachePolicy::Ttl(ttl.unwrap_or(DEFAULT_CACHE_TTL_MS)),
            },
        };

        Ok(Generator::Script {
            command: ScriptCommand::Literal(shape.command),
            post_process: None,
            cache,
        })
    }
}
