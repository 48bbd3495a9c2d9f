#![warn(rust_2018_idioms)]

pub mod adapter;
pub mod app;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod format;
pub mod port;
pub mod protocol;
pub mod queue;
#[doc(hidden)]
pub mod test_support;

pub use app::daemon::Daemon;
pub use client::{ClientError, LogClient};
