// ── CLI surface ──

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "padlink",
    version,
    about = "Bridge a wall-panel button/LED controller to smart-home actions"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Alternate config file path.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of a running daemon, for the client commands.
    /// Defaults to the configured [http].bind address.
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bridge daemon.
    Run,

    /// Fire a button's configured action on a running daemon.
    ///
    /// Identical dispatch semantics to a physical press→release.
    Trigger {
        /// Button number, 1..=10 (10 cycles the mode).
        button: u8,
    },

    /// Set the panel LED to an explicit RGB color.
    Led { r: u8, g: u8, b: u8 },

    /// Advance the mode-cycle palette.
    Cycle,

    /// Show daemon connection state, mode, and LED color.
    Status,

    /// Configuration helpers.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file path.
    Path,
    /// Print the effective configuration as TOML.
    Show,
}
