use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::debug;

pub mod client;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod spec;

use crate::config::Settings;
use crate::daemon::DaemonServer;
use crate::engine::CompletionEngine;
use crate::errors::display_user_error;
use tabd_types::{CompleteRequest, RequestKind, Shell};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub subcommand: SubCommand,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Run the completion daemon in the foreground
    Daemon {
        /// Socket path to listen on
        #[arg(long)]
        socket: Option<String>,

        /// Shell history file to index
        #[arg(long)]
        history_file: Option<String>,

        /// Directory with user completion spec files
        #[arg(long)]
        spec_dir: Option<String>,
    },
    /// Complete a command line once, without a daemon
    Complete {
        /// The command line to complete
        #[arg(long)]
        line: String,

        /// Cursor offset in characters, defaulting to the end of the line
        #[arg(long)]
        cursor: Option<usize>,

        /// Working directory for path and generator lookups
        #[arg(long)]
        cwd: Option<String>,

        /// Shell dialect of the caller (zsh, bash, fish)
        #[arg(long, default_value = "zsh")]
        shell: String,

        /// Print suggestions as JSON instead of tab-separated text
        #[arg(long)]
        json: bool,
    },
    /// Stop a running daemon
    Stop {
        #[arg(long)]
        socket: Option<String>,
    },
    /// Check whether a daemon is running
    Status {
        #[arg(long)]
        socket: Option<String>,
    },
    /// List the completion specs that would be loaded
    Specs {
        #[arg(long)]
        spec_dir: Option<String>,
    },
}

pub fn lib_main() -> ExitCode {
    init_tracing();

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(run_cli())
}

async fn run_cli() -> ExitCode {
    let cli = Cli::parse();

    match cli.subcommand {
        SubCommand::Daemon {
            socket,
            history_file,
            spec_dir,
        } => handle_daemon(Settings::resolve(socket, history_file, spec_dir)).await,
        SubCommand::Complete {
            line,
            cursor,
            cwd,
            shell,
            json,
        } => handle_complete(line, cursor, cwd, &shell, json).await,
        SubCommand::Stop { socket } => handle_stop(&Settings::resolve(socket, None, None)).await,
        SubCommand::Status { socket } => {
            handle_status(&Settings::resolve(socket, None, None)).await
        }
        SubCommand::Specs { spec_dir } => handle_specs(Settings::resolve(None, None, spec_dir)),
    }
}

async fn handle_daemon(settings: Settings) -> ExitCode {
    debug!("starting daemon on {}", settings.socket_path.display());

    let mut engine = CompletionEngine::new(settings.history_file.clone());
    if let Err(err) = engine.initialize(settings.spec_dirs.clone()) {
        display_user_error(&err, false);
        return ExitCode::FAILURE;
    }

    match DaemonServer::new(engine, settings.socket_path).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            display_user_error(&err, false);
            ExitCode::FAILURE
        }
    }
}

async fn handle_complete(
    line: String,
    cursor: Option<usize>,
    cwd: Option<String>,
    shell: &str,
    json: bool,
) -> ExitCode {
    let settings = Settings::resolve(None, None, None);

    let mut engine = CompletionEngine::new(settings.history_file);
    if let Err(err) = engine.initialize(settings.spec_dirs) {
        display_user_error(&err, false);
        return ExitCode::FAILURE;
    }

    let cursor = cursor.unwrap_or_else(|| line.chars().count());
    let request =
        CompleteRequest::complete(line, cursor, cwd.unwrap_or_default(), parse_shell(shell));
    let suggestions = engine.get_completions(&request).await;

    if json {
        match serde_json::to_string(&suggestions) {
            Ok(out) => println!("{out}"),
            Err(err) => {
                display_user_error(&anyhow::Error::new(err), false);
                return ExitCode::FAILURE;
            }
        }
    } else {
        for suggestion in &suggestions {
            match &suggestion.description {
                Some(description) => println!("{}\t{description}", suggestion.insert_text()),
                None => println!("{}", suggestion.insert_text()),
            }
        }
    }
    ExitCode::SUCCESS
}

async fn handle_stop(settings: &Settings) -> ExitCode {
    let request = CompleteRequest::control(RequestKind::Shutdown);
    match client::send_request(&settings.socket_path, &request).await {
        Ok(response) if response.success => {
            println!("tabd stopped");
            ExitCode::SUCCESS
        }
        Ok(response) => {
            eprintln!(
                "tabd: daemon refused shutdown: {}",
                response.error.unwrap_or_default()
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            display_user_error(&err, true);
            println!("tabd is not running");
            ExitCode::SUCCESS
        }
    }
}

async fn handle_status(settings: &Settings) -> ExitCode {
    if client::ping(&settings.socket_path).await {
        println!("tabd running at {}", settings.socket_path.display());
        ExitCode::SUCCESS
    } else {
        println!("tabd is not running");
        ExitCode::FAILURE
    }
}

fn handle_specs(settings: Settings) -> ExitCode {
    let mut registry = spec::registry::SpecRegistry::new();
    spec::builtin::register_builtins(&mut registry);

    if let Err(err) = spec::loader::SpecLoader::with_dirs(settings.spec_dirs)
        .load_into(&mut registry)
    {
        display_user_error(&err, false);
        return ExitCode::FAILURE;
    }

    for name in registry.command_names() {
        println!("{name}");
    }
    let count = registry.count();
    eprintln!(
        "{} specs ({} builtin, {} from spec files)",
        count.total, count.builtin, count.dynamic
    );
    ExitCode::SUCCESS
}

fn parse_shell(name: &str) -> Shell {
    match name.to_ascii_lowercase().as_str() {
        "bash" => Shell::Bash,
        "fish" => Shell::Fish,
        _ => Shell::Zsh,
    }
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("TABD_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}
