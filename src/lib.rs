//! doorman - a minimal TCP accept-loop server with graceful shutdown
//!
//! This library provides a listener lifecycle manager:
//! - sequential accept loop with per-connection dispatch
//! - pluggable connection handler boundary
//! - signal-driven graceful shutdown with idempotent socket release

pub mod config;
pub mod error;
pub mod handler;
pub mod listener;
pub mod signal;

pub use config::ServerConfig;
pub use error::{DoormanError, Result};
pub use handler::{ConnectionHandler, DiscardHandler, PeerConnection};
pub use listener::{LifecycleState, ListenerHandle, RunState, Server};
pub use signal::TerminationSignal;
