//! Claude Changes - Reconstruct and surface file changes from Claude Code
//! session logs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use claude_changes::config::{ChangesConfig, ConfigLoader};
use claude_changes::display::{self, TerminalSink};
use claude_changes::heuristic::HeuristicDetector;
use claude_changes::live::{LiveChangeTracker, LiveFeed};
use claude_changes::session::{
    discover_session, extract_changes, find_session_by_id, list_workspace_sessions,
    read_session_events, SessionMetadata,
};

#[derive(Parser)]
#[command(
    name = "claude-changes",
    about = "Reconstruct file changes from Claude Code session logs",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use this config file instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List session logs of a workspace, newest first.
    Sessions {
        /// Workspace path (defaults to the current directory).
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },
    /// Print the changes recorded in a session.
    Changes {
        /// Workspace path (defaults to the current directory).
        #[arg(short, long)]
        workspace: Option<PathBuf>,
        /// Session id (defaults to the newest session).
        #[arg(short, long)]
        session: Option<String>,
        /// Print records as JSON.
        #[arg(long)]
        json: bool,
        /// Do not truncate or preview content.
        #[arg(long)]
        raw: bool,
    },
    /// Summarize a session.
    Summary {
        /// Workspace path (defaults to the current directory).
        #[arg(short, long)]
        workspace: Option<PathBuf>,
        /// Session id (defaults to the newest session).
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Print new changes as the agent makes them.
    Watch {
        /// Workspace path (defaults to the current directory).
        #[arg(short, long)]
        workspace: Option<PathBuf>,
        /// Also detect changes made outside the agent.
        #[arg(long)]
        heuristic: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn resolve_workspace(workspace: Option<PathBuf>) -> PathBuf {
    let path = match workspace {
        Some(path) => path,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    std::fs::canonicalize(&path).unwrap_or(path)
}

fn resolve_session(
    roots: &[PathBuf],
    workspace: &Path,
    session: Option<&str>,
) -> Option<PathBuf> {
    match session {
        Some(id) => find_session_by_id(roots, workspace, id),
        None => discover_session(roots, workspace),
    }
}

fn load_config(path: Option<PathBuf>) -> ChangesConfig {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    match loader.load() {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e.to_string());
            tracing::warn!(error = %e, "Falling back to default configuration");
            ChangesConfig::default()
        }
    }
}

async fn watch(config: ChangesConfig, workspace: PathBuf, heuristic: bool) {
    let shutdown = CancellationToken::new();
    let sink = Arc::new(TerminalSink);

    if heuristic || config.heuristic.enabled {
        let (mut detector, settled_rx) =
            HeuristicDetector::new(&workspace, &config.heuristic, sink.clone());
        match detector.enable_watching(Vec::new()) {
            Ok(fs_rx) => {
                tokio::spawn(detector.run(fs_rx, settled_rx, shutdown.clone()));
            }
            Err(e) => display::print_error(&format!("Heuristic detection unavailable: {e}")),
        }
    }

    let tracker = LiveChangeTracker::new(sink, config.live.delivery_delay());
    let mut feed = LiveFeed::new(config.sessions.resolved_roots(), workspace, tracker);

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
        }
        signal_token.cancel();
    });

    feed.run(config.live.poll_interval(), shutdown).await;
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config);
    let roots = config.sessions.resolved_roots();

    match cli.command {
        Commands::Sessions { workspace } => {
            let workspace = resolve_workspace(workspace);
            display::print_sessions(&list_workspace_sessions(&roots, &workspace));
        }
        Commands::Changes {
            workspace,
            session,
            json,
            raw,
        } => {
            let workspace = resolve_workspace(workspace);
            let Some(path) = resolve_session(&roots, &workspace, session.as_deref()) else {
                display::print_error("No session found for this workspace");
                std::process::exit(1);
            };
            let events = read_session_events(&path).await;
            let changes = extract_changes(&events);

            if json {
                match serde_json::to_string_pretty(&changes) {
                    Ok(out) => println!("{out}"),
                    Err(e) => display::print_error(&e.to_string()),
                }
            } else {
                for change in &changes {
                    display::print_change(change, raw);
                }
            }
        }
        Commands::Summary { workspace, session } => {
            let workspace = resolve_workspace(workspace);
            let Some(path) = resolve_session(&roots, &workspace, session.as_deref()) else {
                display::print_error("No session found for this workspace");
                std::process::exit(1);
            };
            let events = read_session_events(&path).await;
            display::print_summary(&SessionMetadata::from_events(&events));
        }
        Commands::Watch {
            workspace,
            heuristic,
        } => {
            let workspace = resolve_workspace(workspace);
            tracing::info!(workspace = %workspace.display(), "Watching for changes");
            watch(config, workspace, heuristic).await;
        }
    }
}
