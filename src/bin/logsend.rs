//! Send a single entry to a running log daemon.
//!
//! `logsend <port> <level> <message...>`

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rask_logd::LogClient;
use rask_logd::domain::Severity;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Level {
    Info,
    Debug,
    Error,
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::Info => Severity::Info,
            Level::Debug => Severity::Debug,
            Level::Error => Severity::Error,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "logsend", author, version, about = "Send one log line to the log daemon")]
struct Args {
    /// Port the daemon listens on
    port: u16,

    /// Severity of the message
    #[arg(value_enum)]
    level: Level,

    /// Message text; multiple words are joined with spaces
    #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
    message: Vec<String>,

    /// Address of the daemon host
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = LogClient::new(SocketAddr::new(args.host, args.port));
    let message = args.message.join(" ");

    client
        .write_log(args.level.into(), &message)
        .await
        .with_context(|| format!("sending {} message to {}", Severity::from(args.level), client.addr()))?;
    Ok(())
}
