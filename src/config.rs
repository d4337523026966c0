//! Server configuration
//!
//! A small config layer: compiled-in defaults, an optional TOML file,
//! and environment variable overrides on top.

use crate::error::{DoormanError, Result};
use serde::Deserialize;
use std::env;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;

/// Default TCP port to listen on.
pub const DEFAULT_PORT: u16 = 8110;

/// Default number of pending connections the OS queues for the listener.
pub const DEFAULT_BACKLOG: u32 = 20;

/// doorman server configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Host to bind; the wildcard address by default.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Listen backlog length.
    pub backlog: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file. Missing keys fall back to
    /// the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Apply `DOORMAN_HOST`, `DOORMAN_PORT` and `DOORMAN_BACKLOG`
    /// environment overrides.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(host) = env::var("DOORMAN_HOST") {
            self.host = host;
        }
        if let Ok(port) = env::var("DOORMAN_PORT") {
            self.port = port
                .parse()
                .map_err(|_| DoormanError::Config(format!("invalid DOORMAN_PORT: {port}")))?;
        }
        if let Ok(backlog) = env::var("DOORMAN_BACKLOG") {
            self.backlog = backlog
                .parse()
                .map_err(|_| DoormanError::Config(format!("invalid DOORMAN_BACKLOG: {backlog}")))?;
        }
        Ok(self)
    }

    /// Resolve the configured host and port to a concrete socket
    /// address. The first resolved address wins; its family decides
    /// whether the listener is IPv4 or IPv6.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| {
                DoormanError::Config(format!(
                    "failed to resolve {}:{}: {}",
                    self.host, self.port, e
                ))
            })?
            .next()
            .ok_or_else(|| {
                DoormanError::Config(format!("no usable address for {}:{}", self.host, self.port))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.backlog, DEFAULT_BACKLOG);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "host = \"127.0.0.1\"\nport = 9000").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        // Unset keys keep their defaults
        assert_eq!(config.backlog, DEFAULT_BACKLOG);
    }

    #[test]
    fn test_from_file_rejects_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "prot = 9000").unwrap();

        let result = ServerConfig::from_file(file.path());
        assert!(matches!(result, Err(DoormanError::ConfigParse(_))));
    }

    #[test]
    fn test_bind_addr_resolution() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8110,
            backlog: 20,
        };
        let addr = config.bind_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8110");
        assert!(addr.is_ipv4());
    }

    #[test]
    fn test_bind_addr_wildcard_v6() {
        let config = ServerConfig {
            host: "::".to_string(),
            port: 8110,
            backlog: 20,
        };
        let addr = config.bind_addr().unwrap();
        assert!(addr.is_ipv6());
    }

    #[test]
    fn test_bind_addr_resolution_failure_is_fatal() {
        // "invalid" is reserved to never resolve (RFC 6761)
        let config = ServerConfig {
            host: "host.invalid".to_string(),
            port: 8110,
            backlog: 20,
        };
        match config.bind_addr() {
            Err(e) => assert!(e.is_fatal()),
            Ok(addr) => panic!("resolved {addr} for an unresolvable host"),
        }
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        env::set_var("DOORMAN_PORT", "not-a-port");
        let result = ServerConfig::default().apply_env();
        env::remove_var("DOORMAN_PORT");
        assert!(matches!(result, Err(DoormanError::Config(_))));
    }
}
