//! The administrative console.
//!
//! This module provides the console infrastructure:
//! - [`Command`] descriptors and the [`Context`] their actions receive
//! - [`CommandRegistry`] mapping names to descriptors
//! - [`Console`] for tokenizing and dispatching input lines
//! - [`help`] for the aligned command table
//! - [`expr`] for the operator expression language used by `eval` and `setting`
//! - [`builtins`] for the built-in command catalogue
//!
//! # Example
//!
//! ```
//! use cellhost::config::Settings;
//! use cellhost::console::{Console, DispatchOutcome};
//! use cellhost::output::MockSink;
//! use cellhost::server::ServerHandle;
//!
//! let sink = MockSink::new();
//! let mut server = ServerHandle::new(Settings::default(), Box::new(sink.clone()));
//! let console = Console::with_builtins();
//!
//! assert_eq!(console.dispatch("test", &mut server), DispatchOutcome::Completed);
//! assert_eq!(sink.last().as_deref(), Some("success successful"));
//! ```

pub mod args;
pub mod builtins;
pub mod command;
pub mod dispatcher;
pub mod duration;
pub mod expr;
pub mod help;
pub mod registry;

pub use command::{Action, Command, Context};
pub use dispatcher::{Console, DispatchOutcome};
pub use duration::pretty_print;
pub use registry::CommandRegistry;
