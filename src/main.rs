//! doorman server binary
//!
//! Binds the configured port, accepts connections until SIGINT or
//! SIGTERM arrives, then closes the listener and re-raises the signal.

use doorman::{signal, DiscardHandler, Result, Server, ServerConfig, TerminationSignal};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn load_config() -> Result<ServerConfig> {
    // Optional TOML config path as the only argument, then env overrides
    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    config.apply_env()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = Arc::new(Server::new(config, Arc::new(DiscardHandler)));

    let mut handle = match server.initialize().await {
        Ok(handle) => handle,
        Err(e) => {
            error!("failed to initialize listener: {}", e);
            std::process::exit(1);
        }
    };

    // Watch for termination signals and ask the accept loop to stop
    let signal_server = Arc::clone(&server);
    let signal_watcher = tokio::spawn(async move {
        let sig = signal::wait_for_termination().await?;
        info!("received {}, shutting down", sig);
        signal_server.shutdown();
        Ok::<TerminationSignal, doorman::DoormanError>(sig)
    });

    if let Err(e) = server.run(&mut handle).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }

    // run only returns once shutdown() has been called, and only the
    // signal watcher calls it here, so its result is ready or about to
    // be. The listener is released; hand the signal back to its
    // default disposition so the exit status is the conventional one.
    match signal_watcher.await {
        Ok(Ok(sig)) => signal::reraise(sig),
        Ok(Err(e)) => {
            error!("signal watcher failed: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("signal watcher panicked: {}", e);
            std::process::exit(1);
        }
    }
}
