//! CLI argument parsing for the suspendify driver

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "suspendify")]
#[command(author, version, about = "Drive a resume/suspend coordinator from the command line", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay the interleaved resume/suspend demo
    Demo {
        /// Remaining grace the demo oracle reports, in ms (default: 30000)
        #[arg(long)]
        poll_ms: Option<u64>,
    },

    /// Execute a command script (reads stdin when no file is given)
    Run {
        /// Script file, one command per line
        file: Option<PathBuf>,

        /// Enable a linger oracle reporting this much remaining grace, in ms
        #[arg(long)]
        poll_ms: Option<u64>,
    },

    /// Print the effective configuration
    Config,
}
