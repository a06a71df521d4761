//! Argument validation helpers shared by the built-in commands.
//!
//! Each helper maps to one stage of the validation chain and fails with the
//! operator-facing message for that stage.

use crate::error::{ConsoleError, Result};

/// Positional argument `index`, or `missing <field>`.
pub fn required<'a>(argv: &[&'a str], index: usize, field: &'static str) -> Result<&'a str> {
    argv.get(index)
        .copied()
        .ok_or(ConsoleError::MissingArgument { field })
}

/// An id argument, or `invalid number for <field>`.
pub fn parse_id(raw: &str, field: &'static str) -> Result<u32> {
    raw.parse().map_err(|_| ConsoleError::InvalidNumber { field })
}

/// A finite float argument, or `invalid number for <field>`.
pub fn parse_float(raw: &str, field: &'static str) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ConsoleError::InvalidNumber { field })
}

/// An optional count at `index`, defaulting to one.
pub fn parse_count(argv: &[&str], index: usize) -> Result<u32> {
    match argv.get(index) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConsoleError::InvalidNumber { field: "count" }),
        None => Ok(1),
    }
}
