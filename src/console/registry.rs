//! Command registry.
//!
//! The [`CommandRegistry`] stores every console command by name. A later
//! registration under an existing name replaces the earlier descriptor as a
//! whole, so built-ins can be overridden or extended after startup.

use std::collections::HashMap;

use tracing::warn;

use super::command::Command;

/// Registry of console commands.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Create a registry with all built-in commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::builtins::register_all(&mut registry);
        registry
    }

    /// Register a command; last registration wins.
    ///
    /// Returns the replaced descriptor, if any.
    pub fn register(&mut self, command: Command) -> Option<Command> {
        let replaced = self.commands.insert(command.name().to_string(), command);
        if let Some(old) = &replaced {
            warn!("Console command '{}' was overridden", old.name());
        }
        replaced
    }

    /// Get a command by exact, case-sensitive name.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Iterate over all commands in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// All commands sorted by name.
    pub fn sorted(&self) -> Vec<&Command> {
        let mut commands: Vec<&Command> = self.iter().collect();
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        commands
    }

    /// Get the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
