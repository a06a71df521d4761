//! Uptime formatting.

/// Render whole seconds as the coarsest two units that apply.
///
/// Each unit is truncated, never rounded. Once days are shown the minutes
/// are dropped.
pub fn pretty_print(seconds: u64) -> String {
    let minutes = seconds / 60;
    if minutes < 1 {
        return format!("{} seconds", seconds);
    }
    let hours = minutes / 60;
    if hours < 1 {
        return format!("{} minutes", minutes);
    }
    let days = hours / 24;
    if days < 1 {
        return format!("{} hours {} minutes", hours, minutes % 60);
    }
    format!("{} days {} hours", days, hours % 24)
}
