use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wl_core::StrategyKind;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    /// Playlist API scan and delete
    Api,
    /// Browser automation through the save dialog
    Ui,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Api => StrategyKind::Api,
            StrategyArg::Ui => StrategyKind::Ui,
        }
    }
}

/// Remove videos flagged in a Notion database from the Watch Later playlist
#[derive(Parser, Debug)]
#[command(name = "wl-reconcile", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// TOML configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured removal strategy
    #[arg(long, value_enum, global = true)]
    pub strategy: Option<StrategyArg>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Process every pending task (default)
    Run {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List pending tasks without touching the playlist
    Pending,
    /// Check that the task database is reachable and has the expected properties
    CheckSource,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run { json: false })
    }
}
