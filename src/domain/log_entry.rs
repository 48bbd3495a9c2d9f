use super::Severity;

/// Session banner committed once per daemon run.
pub const SESSION_BANNER: &str = concat!(
    "-------------------------------------------------------------------------------\n",
    "                                  New Log\n",
    "-------------------------------------------------------------------------------\n",
);

/// One decoded log line travelling from a connection to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Severity,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Severity, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// The synthetic entry marking the start of a new logging session.
    #[must_use]
    pub fn session_header() -> Self {
        Self::new(Severity::Header, SESSION_BANNER)
    }
}
