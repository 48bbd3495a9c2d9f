pub mod log_entry;
pub mod severity;

pub use log_entry::{LogEntry, SESSION_BANNER};
pub use severity::{Severity, UnknownSeverity};
