//! Line dispatching.
//!
//! [`Console::dispatch`] is the console's error boundary: whatever a command
//! does, including returning an error or panicking, the caller gets a
//! [`DispatchOutcome`] and the operator gets one line of output.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use super::command::Context;
use super::registry::CommandRegistry;
use crate::server::ServerHandle;

/// Line printed for names that are not registered.
pub const UNKNOWN_COMMAND: &str = "unknown command";

/// How a dispatched line ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The line had no tokens.
    Empty,
    /// No command has this name.
    Unknown(String),
    /// The command ran to completion.
    Completed,
    /// The command reported this message instead of completing.
    Failed(String),
}

/// Tokenizes input lines and runs the matching commands.
#[derive(Debug, Default)]
pub struct Console {
    registry: CommandRegistry,
}

impl Console {
    /// Create a console over the given registry.
    pub fn new(registry: CommandRegistry) -> Self {
        Self { registry }
    }

    /// Create a console with the built-in command set.
    pub fn with_builtins() -> Self {
        Self::new(CommandRegistry::with_builtins())
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Mutable registry access, for registering extra commands.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Run one input line against the server.
    ///
    /// The first whitespace-delimited token names the command; the rest are
    /// passed through as string arguments. The command runs to completion
    /// before this returns.
    pub fn dispatch(&self, line: &str, server: &mut ServerHandle) -> DispatchOutcome {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((name, argv)) = tokens.split_first() else {
            return DispatchOutcome::Empty;
        };

        let Some(command) = self.registry.get(name) else {
            server.print(UNKNOWN_COMMAND);
            return DispatchOutcome::Unknown(name.to_string());
        };

        debug!("Dispatching '{}' with {} args", name, argv.len());
        let mut ctx = Context {
            server,
            commands: &self.registry,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| command.run(&mut ctx, argv))) {
            Ok(Ok(())) => DispatchOutcome::Completed,
            Ok(Err(e)) => {
                let message = e.to_string();
                debug!("Command '{}' failed: {}", name, message);
                ctx.print(&message);
                DispatchOutcome::Failed(message)
            }
            Err(payload) => {
                let message = format!("command '{}' panicked: {}", name, panic_message(&*payload));
                ctx.print(&message);
                DispatchOutcome::Failed(message)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::console::command::Command;
    use crate::error::ConsoleError;
    use crate::output::MockSink;

    fn setup() -> (Console, ServerHandle, MockSink) {
        let sink = MockSink::new();
        let server = ServerHandle::new(Settings::default(), Box::new(sink.clone()));
        let mut registry = CommandRegistry::new();
        registry.register(Command::new("echo", "<text...>", "echo", |ctx, argv| {
            ctx.print(argv.join(","));
            Ok(())
        }));
        registry.register(Command::new("fail", "", "always fails", |_, _| {
            Err(ConsoleError::NoSettingName)
        }));
        registry.register(Command::new("boom", "", "panics", |_, _| {
            panic!("kaboom")
        }));
        (Console::new(registry), server, sink)
    }

    #[test]
    fn empty_line_is_noop() {
        let (console, mut server, sink) = setup();
        assert_eq!(console.dispatch("   \t ", &mut server), DispatchOutcome::Empty);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn unknown_command_prints_fixed_message() {
        let (console, mut server, sink) = setup();
        assert_eq!(
            console.dispatch("nope 1 2", &mut server),
            DispatchOutcome::Unknown("nope".to_string())
        );
        assert_eq!(sink.lines(), vec![UNKNOWN_COMMAND]);
    }

    #[test]
    fn names_are_case_sensitive() {
        let (console, mut server, _sink) = setup();
        assert!(matches!(
            console.dispatch("ECHO", &mut server),
            DispatchOutcome::Unknown(_)
        ));
    }

    #[test]
    fn arguments_split_on_any_whitespace() {
        let (console, mut server, sink) = setup();
        assert_eq!(
            console.dispatch("  echo a\t b   c ", &mut server),
            DispatchOutcome::Completed
        );
        assert_eq!(sink.lines(), vec!["a,b,c"]);
    }

    #[test]
    fn errors_are_printed_not_propagated() {
        let (console, mut server, sink) = setup();
        assert_eq!(
            console.dispatch("fail", &mut server),
            DispatchOutcome::Failed("no setting name provided".to_string())
        );
        assert_eq!(sink.lines(), vec!["no setting name provided"]);
    }

    #[test]
    fn panics_are_contained() {
        let (console, mut server, sink) = setup();
        let outcome = console.dispatch("boom", &mut server);
        assert!(matches!(outcome, DispatchOutcome::Failed(ref m) if m.contains("kaboom")));
        assert_eq!(console.dispatch("echo ok", &mut server), DispatchOutcome::Completed);
        assert_eq!(sink.last().as_deref(), Some("ok"));
    }
}
