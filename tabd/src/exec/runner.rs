use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

/// Default wall-clock budget for one generator command.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Generators producing more stdout than this are treated as failed.
pub const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Captured result of one shell command.
///
/// Running a command never returns an error. Spawn failures and
/// timeouts are folded into the exit code so callers have a single
/// failure signal to check.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    fn failure(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }
}

/// Executes generator commands through the shell.
///
/// The trait is the seam that lets executor tests swap in a mock
/// instead of spawning processes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str, cwd: &Path) -> CommandOutput;
}

/// Real runner backed by `sh -c` under a timeout.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, command: &str, cwd: &Path) -> CommandOutput {
        debug!("running generator command: {}", command);

        let child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => {
                if output.stdout.len() > MAX_OUTPUT_BYTES {
                    return CommandOutput::failure(
                        format!("output exceeded {} bytes", MAX_OUTPUT_BYTES),
                        1,
                    );
                }
                CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code: output.status.code().unwrap_or(-1),
                }
            }
            Ok(Err(e)) => CommandOutput::failure(format!("failed to spawn: {e}"), 127),
            Err(_) => CommandOutput::failure(
                format!("timed out after {}ms", self.timeout.as_millis()),
                124,
            ),
        }
    }
}

/// Scripted runner for tests. Records every command it is asked to run.
#[cfg(test)]
pub struct MockCommandRunner {
    responses: std::collections::HashMap<String, CommandOutput>,
    calls: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockCommandRunner {
    pub fn new() -> Self {
        Self {
            responses: std::collections::HashMap::new(),
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, command: &str, stdout: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: 0,
            },
        );
        self
    }

    pub fn fail(mut self, command: &str, stderr: &str, exit_code: i32) -> Self {
        self.responses
            .insert(command.to_string(), CommandOutput::failure(stderr, exit_code));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == command).count()
    }
}

#[cfg(test)]
#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, command: &str, _cwd: &Path) -> CommandOutput {
        self.calls.lock().push(command.to_string());
        self.responses
            .get(command)
            .cloned()
            .unwrap_or_else(|| CommandOutput::failure("no scripted response", 127))
    }
}
