//! Rendering of entries into the bytes written to the sink.

use crate::domain::LogEntry;

/// Reset sequence closing every colored line.
pub const ANSI_RESET: &str = "\x1b[0m";

/// How a sink wants its lines rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Colored,
}

/// Render one entry as a single newline-terminated line.
///
/// Plain output is `prefix + message`, newline-terminated. Colored output
/// wraps the prefixed message in the level's color and a reset, with the
/// newline after the reset.
#[must_use]
pub fn format_entry(entry: &LogEntry, style: Style) -> String {
    let prefix = entry.level.prefix();
    match style {
        Style::Plain => {
            let mut line = String::with_capacity(prefix.len() + entry.message.len() + 1);
            line.push_str(prefix);
            line.push_str(&entry.message);
            if !line.ends_with('\n') {
                line.push('\n');
            }
            line
        }
        Style::Colored => {
            let color = entry.level.ansi_color();
            let body = entry.message.strip_suffix('\n').unwrap_or(&entry.message);
            let mut line = String::with_capacity(
                color.len() + prefix.len() + body.len() + ANSI_RESET.len() + 1,
            );
            line.push_str(color);
            line.push_str(prefix);
            line.push_str(body);
            line.push_str(ANSI_RESET);
            line.push('\n');
            line
        }
    }
}
