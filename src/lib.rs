//! cellhost - Cell arena game server with a live administrative console.
//!
//! The console is a text control surface embedded in the running server. An
//! operator types one command per line to inspect and change settings,
//! control the server lifecycle, and mutate live players and worlds without
//! a restart.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and server boot
//! - [`config`] - Settings schema and YAML persistence
//! - [`console`] - Command registry, dispatcher, help and built-in commands
//! - [`error`] - Error types and result aliases
//! - [`output`] - Output sinks for console text
//! - [`runtime`] - Single-owner execution of ticks and commands
//! - [`server`] - The server handle: players, worlds, cells, ticker
//!
//! # Example
//!
//! ```
//! use cellhost::config::Settings;
//! use cellhost::console::Console;
//! use cellhost::output::MockSink;
//! use cellhost::server::ServerHandle;
//!
//! let sink = MockSink::new();
//! let mut server = ServerHandle::new(Settings::default(), Box::new(sink.clone()));
//! server.start();
//! let player = server.connect(1, "alice").unwrap();
//!
//! let console = Console::with_builtins();
//! console.dispatch(&format!("mass {} 250", player), &mut server);
//! assert_eq!(sink.last().as_deref(), Some("player now has 250 mass"));
//! ```

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod output;
pub mod runtime;
pub mod server;

pub use error::{ConsoleError, Result};
