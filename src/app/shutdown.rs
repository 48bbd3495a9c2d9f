use std::fmt;
#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::warn;

/// Signal that ended the serve loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// SIGINT and SIGTERM handlers, registered as soon as this is built so a
/// signal arriving before anyone waits is still observed.
///
/// Fault signals keep their default action and a failure exit status.
/// A signal whose handler cannot be installed is simply never reported.
pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: Option<Signal>,
    #[cfg(unix)]
    terminate: Option<Signal>,
}

impl ShutdownSignals {
    /// Must be called from within the runtime.
    #[must_use]
    pub fn install() -> Self {
        #[cfg(unix)]
        {
            Self {
                interrupt: register(SignalKind::interrupt(), ShutdownSignal::Interrupt),
                terminate: register(SignalKind::terminate(), ShutdownSignal::Terminate),
            }
        }
        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    /// Resolve on the first SIGINT or SIGTERM.
    pub async fn recv(&mut self) -> ShutdownSignal {
        #[cfg(unix)]
        {
            tokio::select! {
                () = next(&mut self.interrupt) => ShutdownSignal::Interrupt,
                () = next(&mut self.terminate) => ShutdownSignal::Terminate,
            }
        }
        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to install SIGINT handler");
                std::future::pending::<()>().await;
            }
            ShutdownSignal::Interrupt
        }
    }
}

#[cfg(unix)]
fn register(kind: SignalKind, name: ShutdownSignal) -> Option<Signal> {
    match signal(kind) {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!(signal = %name, error = %e, "Failed to install signal handler");
            None
        }
    }
}

#[cfg(unix)]
async fn next(stream: &mut Option<Signal>) {
    if let Some(stream) = stream {
        if stream.recv().await.is_some() {
            return;
        }
    }
    std::future::pending::<()>().await;
}
