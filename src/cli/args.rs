//! CLI argument definitions.
//!
//! This module defines the CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::Parser;
use std::path::PathBuf;

/// cellhost - Cell arena game server with a live administrative console.
///
/// Console commands are read from standard input, one per line. Type `help`
/// for the command list.
#[derive(Debug, Parser)]
#[command(name = "cellhost")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the settings file (YAML); settings changes are saved back to it
    #[arg(short, long, env = "CELLHOST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not start the server at boot; use the `start` command instead
    #[arg(long)]
    pub no_start: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}
