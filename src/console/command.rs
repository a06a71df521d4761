//! Command descriptors.

use std::fmt;

use super::registry::CommandRegistry;
use crate::error::Result;
use crate::server::ServerHandle;

/// What a command action receives besides its arguments.
pub struct Context<'a> {
    /// The live server.
    pub server: &'a mut ServerHandle,
    /// Every registered command, for introspection.
    pub commands: &'a CommandRegistry,
}

impl Context<'_> {
    /// Write a line to the server's output sink.
    pub fn print(&mut self, line: impl AsRef<str>) {
        self.server.print(line.as_ref());
    }
}

/// Boxed command action.
pub type Action = Box<dyn Fn(&mut Context<'_>, &[&str]) -> Result<()> + Send + Sync>;

/// An immutable description of one console command.
pub struct Command {
    name: String,
    args: String,
    description: String,
    action: Action,
}

impl Command {
    /// Create a command.
    ///
    /// `name` is the case-sensitive dispatch key and must not contain
    /// whitespace. `args` is display-only; the action validates its own
    /// arguments.
    pub fn new<F>(name: &str, args: &str, description: &str, action: F) -> Self
    where
        F: Fn(&mut Context<'_>, &[&str]) -> Result<()> + Send + Sync + 'static,
    {
        debug_assert!(
            !name.is_empty() && !name.contains(char::is_whitespace),
            "command name must be a single token: {:?}",
            name
        );
        Self {
            name: name.to_string(),
            args: args.to_string(),
            description: description.to_string(),
            action: Box::new(action),
        }
    }

    /// Dispatch key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable argument signature.
    pub fn args(&self) -> &str {
        &self.args
    }

    /// One-line summary shown by `help`.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Run the action.
    pub fn run(&self, ctx: &mut Context<'_>, argv: &[&str]) -> Result<()> {
        (self.action)(ctx, argv)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
