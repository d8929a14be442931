//! CLI argument parsing for todex.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "todex",
    about = "An in-memory todo list with full-text search",
    version,
    after_help = "Logs are written to: ~/.local/share/todex/logs/todex.log"
)]
pub struct Cli {
    /// Directory for the daemon socket (default: $XDG_RUNTIME_DIR/todex)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a todo
    Add {
        /// Todo title
        title: String,

        /// Mark it done straight away
        #[arg(long)]
        done: bool,
    },

    /// Toggle a todo between done and not done
    Toggle {
        /// Todo ID
        id: String,
    },

    /// Remove a todo
    Remove {
        /// Todo ID
        id: String,
    },

    /// List all todos, newest first
    List,

    /// Search todo titles by word or word prefix
    Find {
        /// Search term (lists everything when empty)
        #[arg(default_value = "")]
        term: String,
    },

    /// Print the number of todos
    Count,

    /// Run the daemon in foreground
    Daemon {
        /// Start with a few demo todos
        #[arg(long)]
        seed: bool,
    },

    /// Stop the running daemon
    DaemonStop,

    /// Check daemon status
    DaemonStatus,
}
