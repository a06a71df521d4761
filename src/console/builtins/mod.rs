//! Built-in console commands.
//!
//! - [`server`] - help, settings, lifecycle, diagnostics
//! - [`players`] - live player mutation
//! - [`bots`] - player bots per world

pub mod bots;
pub mod players;
pub mod server;

use super::registry::CommandRegistry;

/// Register the full built-in catalogue.
pub fn register_all(registry: &mut CommandRegistry) {
    server::register(registry);
    players::register(registry);
    bots::register(registry);
}
