//! CLI argument parsing for the roadlog-worker binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "roadlog-worker", about = "HOS trip planning backend worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
}
