//! Diagnostics about the daemon itself. These always go to stderr so they
//! never mix with entries committed to a stdout sink.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable selecting the diagnostic format.
pub const LOG_FORMAT_ENV: &str = "LOGD_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticFormat {
    Json,
    Text,
}

impl DiagnosticFormat {
    /// Read the format from `LOGD_LOG_FORMAT`, falling back to
    /// `RUST_LOG_FORMAT`.
    #[must_use]
    pub fn from_env() -> Self {
        let value = std::env::var(LOG_FORMAT_ENV)
            .or_else(|_| std::env::var("RUST_LOG_FORMAT"))
            .ok();
        Self::parse(value.as_deref())
    }

    /// JSON unless some other value is given explicitly.
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().eq_ignore_ascii_case("json") => DiagnosticFormat::Text,
            _ => DiagnosticFormat::Json,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` filters; `info` otherwise.
pub fn init_tracing(format: DiagnosticFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        DiagnosticFormat::Json => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init(),
        DiagnosticFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }
}
