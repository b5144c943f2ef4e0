//! Breath Coach CLI - guided breathing sessions from the terminal
//!
//! Paced breathing patterns such as 4-7-8, box breathing and coherent
//! breathing, kept in time by a background daemon:
//! - `breath-coach daemon` runs the session timer
//! - `breath-coach start` begins a session, `status` follows it
//! - `breath-coach focus start` runs a focus countdown
//! - `breath-coach history` summarizes past practice

use anyhow::Result;
use chrono::Local;
use clap::{CommandFactory, Parser};

use breath_coach::cli::{Cli, Commands, Display, FocusCommands, HistoryArgs, IpcClient};
use breath_coach::config::Settings;
use breath_coach::history::{JsonHistoryStore, PeriodStats, PracticeSummary};
use breath_coach::types::FOCUS_PRESET_MINUTES;
use breath_coach::{daemon, patterns};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence; otherwise warnings only, or debug output
/// with `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Start(args)) => {
            let client = client()?;
            let response = client.start(&args).await?;
            Display::show_start_success(&response);
        }
        Some(Commands::Focus { action }) => match action {
            FocusCommands::Start(args) => {
                let response = client()?.focus(&args).await?;
                Display::show_focus_success(&response);
            }
            FocusCommands::Presets => {
                let settings = Settings::load()?;
                Display::show_focus_presets(&FOCUS_PRESET_MINUTES, settings.default_focus_minutes);
            }
        },
        Some(Commands::Pause) => {
            let response = client()?.pause().await?;
            Display::show_pause_success(&response);
        }
        Some(Commands::Resume) => {
            let response = client()?.resume().await?;
            Display::show_resume_success(&response);
        }
        Some(Commands::Stop) => {
            let response = client()?.stop().await?;
            Display::show_stop_success(&response);
        }
        Some(Commands::Status) => {
            let response = client()?.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Patterns) => {
            Display::show_patterns(patterns::builtin_patterns());
        }
        Some(Commands::History(args)) => {
            show_history(&args)?;
        }
        Some(Commands::Daemon) => {
            daemon::run(Settings::load()?).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn client() -> Result<IpcClient> {
    IpcClient::new(&Settings::load()?)
}

/// Summarizes the stored session history for the last `args.days` days.
///
/// Days follow the local calendar.
fn show_history(args: &HistoryArgs) -> Result<()> {
    let settings = Settings::load()?;
    let store = JsonHistoryStore::new(settings.history_path()?);
    let mut records = store.load()?;
    if let Some(kind) = args.kind {
        records.retain(|r| r.kind == kind);
    }

    let now = Local::now();
    let stats = PeriodStats::compute(&records, &now, args.days);
    let summary = PracticeSummary::compute(&records, &now);

    Display::show_history(&stats, &summary);
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
