//! Command definitions for the Breath Coach CLI.
//!
//! Uses clap derive macro for argument parsing.

use clap::{Args, Parser, Subcommand};

use crate::config;
use crate::history::SessionKind;
use crate::types::StartParams;

// ============================================================================
// CLI Structure
// ============================================================================

/// Breath Coach - guided breathing sessions from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "breath-coach",
    version,
    about = "Guided breathing sessions from the terminal",
    long_about = "Runs paced breathing sessions (4-7-8, box breathing, coherent breathing and more).\n\
                  A background daemon keeps time; the CLI starts, pauses and inspects sessions.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a breathing session
    Start(StartArgs),

    /// Focus countdown timer
    Focus {
        #[command(subcommand)]
        action: FocusCommands,
    },

    /// Pause the current session
    Pause,

    /// Resume a paused session
    Resume,

    /// Stop the current session
    Stop,

    /// Show the current session
    Status,

    /// List the available breathing patterns
    Patterns,

    /// Show practice statistics from past sessions
    History(HistoryArgs),

    /// Run the session daemon in the foreground
    Daemon,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Focus subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum FocusCommands {
    /// Start a focus countdown
    Start(FocusArgs),

    /// List the preset focus lengths
    Presets,
}

// ============================================================================
// Command Arguments
// ============================================================================

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Breathing pattern id (see `breath-coach patterns`)
    #[arg(short, long, value_parser = validate_pattern_id)]
    pub pattern: Option<String>,

    /// Number of rounds to breathe (1-99)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=99)
    )]
    pub rounds: Option<u32>,

    /// Disable haptic feedback for this session
    #[arg(long)]
    pub no_haptics: bool,
}

impl StartArgs {
    /// Converts the arguments into IPC start parameters.
    ///
    /// Unset options are left for the daemon to fill from its settings.
    pub fn to_params(&self) -> StartParams {
        StartParams {
            pattern_id: self.pattern.clone(),
            target_rounds: self.rounds,
            haptics: self.no_haptics.then_some(false),
        }
    }
}

/// Arguments for the focus start command
#[derive(Args, Debug, Clone, Default)]
pub struct FocusArgs {
    /// Countdown length in minutes (1-1439); the daemon default when omitted
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=1439)
    )]
    pub minutes: Option<u32>,
}

/// Arguments for the history command
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Number of days to summarize, ending today (1-365)
    #[arg(
        short,
        long,
        default_value = "7",
        value_parser = clap::value_parser!(u32).range(1..=365)
    )]
    pub days: u32,

    /// Only count sessions of this kind
    #[arg(short, long, value_enum)]
    pub kind: Option<SessionKind>,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates that the pattern id is in the catalog.
fn validate_pattern_id(s: &str) -> Result<String, String> {
    config::ensure_known_pattern(s)
        .map(|()| s.to_string())
        .map_err(|e| e.to_string())
}

// ============================================================================
// Tests
// ============================================================================
