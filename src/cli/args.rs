//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Observable parent/child/grandchild trees: build, inspect and observe
#[derive(Parser, Debug)]
#[command(name = "obtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (default: ./obtree.toml when present)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Random seed (overrides config)
    #[arg(short, long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build parents from the snapshot and summarise the first one
    Create {
        /// Number of parents (default: config `count`)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Render one parent as a tree
    Show {
        /// Children to list
        #[arg(short, long, default_value_t = 3)]
        limit: usize,
    },

    /// Print the full snapshot of one parent as JSON
    Snapshot {
        /// Single-line output
        #[arg(long)]
        compact: bool,
    },

    /// Apply actions to one parent and print every notification
    Observe {
        /// JSON array of actions (default: built-in three-step script)
        #[arg(long, value_hint = ValueHint::FilePath)]
        script: Option<PathBuf>,
        /// Write the emitted actions to this file
        #[arg(long, value_hint = ValueHint::FilePath)]
        record: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Create config template (at --config or ./obtree.toml)
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
