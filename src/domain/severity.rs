//! Severity levels understood by the daemon.
//!
//! The wire value of each level is its discriminant. `Header` is the
//! synthetic level used for the session banner written at startup.

use std::fmt;

/// Error returned when a numeric level has no matching `Severity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("log level {0} is outside 0..=3")]
pub struct UnknownSeverity(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Severity {
    Header = 0,
    Info = 1,
    Debug = 2,
    Error = 3,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Header,
        Severity::Info,
        Severity::Debug,
        Severity::Error,
    ];

    /// Numeric value used on the wire.
    #[must_use]
    pub fn wire_value(self) -> u8 {
        self as u8
    }

    /// Text written in front of the message. Empty for `Header`.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Severity::Header => "",
            Severity::Info => "Info: ",
            Severity::Debug => "Debug: ",
            Severity::Error => "Error: ",
        }
    }

    /// ANSI SGR sequence used when writing to a console.
    #[must_use]
    pub fn ansi_color(self) -> &'static str {
        match self {
            Severity::Header => "\x1b[0m",
            Severity::Info => "\x1b[0;36m",
            Severity::Debug => "\x1b[0;93m",
            Severity::Error => "\x1b[0;91m",
        }
    }
}

impl TryFrom<i64> for Severity {
    type Error = UnknownSeverity;

    fn try_from(value: i64) -> Result<Self, UnknownSeverity> {
        match value {
            0 => Ok(Severity::Header),
            1 => Ok(Severity::Info),
            2 => Ok(Severity::Debug),
            3 => Ok(Severity::Error),
            other => Err(UnknownSeverity(other)),
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = UnknownSeverity;

    fn try_from(value: u8) -> Result<Self, UnknownSeverity> {
        Severity::try_from(i64::from(value))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Header => "header",
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}
