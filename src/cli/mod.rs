//! Command-line interface for cellhost.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`serve`] - Boot the server and run the console over a line reader

pub mod args;

pub use args::Cli;

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{load_settings, Settings};
use crate::console::Console;
use crate::error::Result;
use crate::output::OutputSink;
use crate::runtime;
use crate::server::ServerHandle;

/// Boot the server described by `cli`, run console lines from `input` until
/// it ends, then shut everything down.
pub fn serve<R: BufRead>(cli: &Cli, input: R, output: Box<dyn OutputSink>) -> Result<()> {
    let settings = match &cli.config {
        Some(path) if path.exists() => load_settings(path)?,
        _ => Settings::default(),
    };

    let mut server = ServerHandle::new(settings, output);
    if let Some(path) = &cli.config {
        server = server.with_settings_path(path.clone());
    }
    if !cli.no_start {
        server.start();
    }

    let shared = runtime::shared(server);
    let shutdown = Arc::new(AtomicBool::new(false));
    let ticker = runtime::spawn_ticker(shared.clone(), shutdown.clone())?;

    let console = Console::with_builtins();
    let result = runtime::run_console(&console, &shared, input);

    shutdown.store(true, Ordering::Relaxed);
    if ticker.join().is_err() {
        tracing::warn!("Ticker thread panicked");
    }
    if let Ok(mut server) = shared.lock() {
        server.stop();
    }

    result.map(|lines| tracing::debug!("Console closed after {} lines", lines))
}
