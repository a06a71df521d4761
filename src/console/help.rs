//! Help table rendering.

use super::command::Command;
use super::registry::CommandRegistry;

/// Narrowest name column.
const MIN_NAME_WIDTH: usize = 4;
/// Narrowest arguments column.
const MIN_ARGS_WIDTH: usize = 10;

/// Column separator placed before the description.
pub const SEPARATOR: &str = " | ";

/// Widths of the name and arguments columns for `commands`.
///
/// The name column leaves room for one trailing space after the longest name.
pub fn column_widths<'a>(commands: impl IntoIterator<Item = &'a Command>) -> (usize, usize) {
    commands
        .into_iter()
        .fold((MIN_NAME_WIDTH, MIN_ARGS_WIDTH), |(name, args), cmd| {
            (name.max(cmd.name().len() + 1), args.max(cmd.args().len()))
        })
}

/// Render the help table: a header, then one row per command sorted by name.
pub fn render(registry: &CommandRegistry) -> Vec<String> {
    let (name_width, args_width) = column_widths(registry.iter());

    // The header cells always keep a space between them; the two minimum
    // widths together leave room for it.
    let header = format!("{:<width$} ARGUMENTS", "NAME", width = name_width - 1);
    let mut lines = Vec::with_capacity(registry.len() + 1);
    lines.push(format!(
        "{:<width$}{}DESCRIPTION",
        header,
        SEPARATOR,
        width = name_width + args_width
    ));
    for cmd in registry.sorted() {
        lines.push(format!(
            "{:<name_width$}{:<args_width$}{}{}",
            cmd.name(),
            cmd.args(),
            SEPARATOR,
            cmd.description()
        ));
    }
    lines
}
