pub mod committer;
pub mod daemon;
pub mod listener;
pub mod shutdown;
pub mod tracing;

use crate::adapter;
use crate::config;
use crate::error::DaemonError;
use daemon::Daemon;
use tokio_util::sync::CancellationToken;

/// Daemon entry point: parse arguments, open the sink, bind, then serve
/// until SIGINT/SIGTERM or a fatal error.
pub async fn run() -> Result<(), DaemonError> {
    tracing::init_tracing(tracing::DiagnosticFormat::from_env());

    let settings = config::get_configuration()?;
    ::tracing::info!(sink = ?settings.sink, port = settings.port, "Loaded settings");

    // Registered before binding: once clients can connect, SIGTERM drains.
    let mut signals = shutdown::ShutdownSignals::install();

    let sink = adapter::open_sink(&settings.sink).await?;
    let daemon = Daemon::bind(&settings, sink).await?;

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        let signal = signals.recv().await;
        ::tracing::info!(%signal, "Received signal, draining queued entries");
        signal_token.cancel();
    });

    daemon.run(shutdown_token).await
}
