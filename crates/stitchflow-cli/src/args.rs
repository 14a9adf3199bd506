//! Command-line argument definitions for the Stitchflow CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the gesture script, an optional snapshot
//! to start from, the output snapshot, the configuration file, and logging
//! verbosity.

use clap::Parser;

/// Command-line arguments for the Stitchflow routing engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the gesture script (JSON)
    #[arg(help = "Path to the gesture script")]
    pub input: String,

    /// Snapshot to start from instead of an empty canvas
    #[arg(long)]
    pub snapshot: Option<String>,

    /// Path to the output snapshot file
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
