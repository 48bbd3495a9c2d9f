use crate::error::DaemonError;
use crate::format::Style;
use crate::port::SinkKind;
use crate::protocol::DEFAULT_MAX_PREFIX_LEN;
use clap::{Parser, ValueEnum};
use std::convert::Infallible;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Token selecting console output instead of a file.
pub const STDOUT_TOKEN: &str = "stdout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Stdout,
    File(PathBuf),
}

impl FromStr for SinkTarget {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(STDOUT_TOKEN) {
            Ok(SinkTarget::Stdout)
        } else {
            Ok(SinkTarget::File(PathBuf::from(s)))
        }
    }
}

/// What a malformed message or failed read does to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProtocolPolicy {
    /// Any bad connection terminates the daemon
    #[default]
    Strict,
    /// Drop only the offending connection and keep serving
    Isolate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConnectionMode {
    /// Read each connection to completion before accepting the next
    #[default]
    Sequential,
    /// Read every connection on its own task
    Concurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Color whenever the sink is the console
    #[default]
    Always,
    /// Color only when the console is a terminal
    Auto,
    /// Never write escape sequences
    Never,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "logger", author, version, about, long_about = None)]
pub struct Settings {
    /// Output sink: `stdout` for the console, otherwise a file opened for append
    pub sink: SinkTarget,

    /// TCP port accepting log messages
    pub port: u16,

    /// Handling of malformed messages and failed reads
    #[arg(long, env = "LOGD_POLICY", value_enum, default_value = "strict")]
    pub policy: ProtocolPolicy,

    /// How accepted connections are read
    #[arg(long, env = "LOGD_CONNECTION_MODE", value_enum, default_value = "sequential")]
    pub connection_mode: ConnectionMode,

    /// When console output is colored
    #[arg(long, env = "LOGD_COLOR", value_enum, default_value = "always")]
    pub color: ColorMode,

    /// Per-connection read deadline in milliseconds (no deadline when unset)
    #[arg(long, env = "LOGD_READ_TIMEOUT_MS")]
    pub read_timeout_ms: Option<u64>,

    /// Maximum number of bytes searched for the level delimiter
    #[arg(long, env = "LOGD_MAX_PREFIX_LEN", default_value = "2048")]
    pub max_prefix_len: usize,
}

impl Settings {
    /// Settings with every option at its default.
    #[must_use]
    pub fn new(sink: SinkTarget, port: u16) -> Self {
        Self {
            sink,
            port,
            policy: ProtocolPolicy::default(),
            connection_mode: ConnectionMode::default(),
            color: ColorMode::default(),
            read_timeout_ms: None,
            max_prefix_len: DEFAULT_MAX_PREFIX_LEN,
        }
    }

    /// Validates the settings and returns an error if invalid.
    pub fn validate(&self) -> Result<(), DaemonError> {
        if let SinkTarget::File(path) = &self.sink {
            validate_path(path)?;
        }
        if self.read_timeout_ms == Some(0) {
            return Err(DaemonError::Config(
                "Read timeout must be greater than 0".into(),
            ));
        }
        if self.max_prefix_len == 0 {
            return Err(DaemonError::Config(
                "Maximum prefix length must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Line style for a sink of the given kind.
    #[must_use]
    pub fn style_for(&self, kind: SinkKind) -> Style {
        match (kind, self.color) {
            (SinkKind::File, _) | (SinkKind::Console, ColorMode::Never) => Style::Plain,
            (SinkKind::Console, ColorMode::Always) => Style::Colored,
            (SinkKind::Console, ColorMode::Auto) => {
                if std::io::stdout().is_terminal() {
                    Style::Colored
                } else {
                    Style::Plain
                }
            }
        }
    }
}

fn validate_path(path: &std::path::Path) -> Result<(), DaemonError> {
    if path.as_os_str().is_empty() {
        return Err(DaemonError::Config("Sink path cannot be empty".into()));
    }
    if path.is_dir() {
        return Err(DaemonError::Config(format!(
            "Sink path {} is a directory",
            path.display()
        )));
    }
    Ok(())
}

/// Parse the command line, exiting with a usage error on malformed
/// arguments, then validate the result.
pub fn get_configuration() -> Result<Settings, DaemonError> {
    let settings = Settings::parse();
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_token_selects_console() {
        assert_eq!(SinkTarget::from_str("stdout").unwrap(), SinkTarget::Stdout);
        assert_eq!(SinkTarget::from_str("STDOUT").unwrap(), SinkTarget::Stdout);
    }

    #[test]
    fn test_other_values_are_paths() {
        assert_eq!(
            SinkTarget::from_str("/tmp/out.log").unwrap(),
            SinkTarget::File(PathBuf::from("/tmp/out.log"))
        );
    }

    #[test]
    fn test_validate_defaults_succeeds() {
        let settings = Settings::new(SinkTarget::Stdout, 9999);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.read_timeout(), None);
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut settings = Settings::new(SinkTarget::Stdout, 9999);
        settings.read_timeout_ms = Some(0);
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("Read timeout"));
    }

    #[test]
    fn test_validate_zero_prefix_len_fails() {
        let mut settings = Settings::new(SinkTarget::Stdout, 9999);
        settings.max_prefix_len = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_directory_sink_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::new(SinkTarget::File(dir.path().to_path_buf()), 9999);
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("is a directory"));
    }

    #[test]
    fn test_validate_empty_path_fails() {
        let settings = Settings::new(SinkTarget::File(PathBuf::new()), 9999);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_style_for_file_is_always_plain() {
        let mut settings = Settings::new(SinkTarget::Stdout, 9999);
        for color in [ColorMode::Always, ColorMode::Auto, ColorMode::Never] {
            settings.color = color;
            assert_eq!(settings.style_for(SinkKind::File), Style::Plain);
        }
    }

    #[test]
    fn test_style_for_console() {
        let mut settings = Settings::new(SinkTarget::Stdout, 9999);
        assert_eq!(settings.style_for(SinkKind::Console), Style::Colored);
        settings.color = ColorMode::Never;
        assert_eq!(settings.style_for(SinkKind::Console), Style::Plain);
    }

    #[test]
    fn test_read_timeout_conversion() {
        let mut settings = Settings::new(SinkTarget::Stdout, 9999);
        settings.read_timeout_ms = Some(250);
        assert_eq!(settings.read_timeout(), Some(Duration::from_millis(250)));
    }
}
