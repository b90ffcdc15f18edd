//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every
//! field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Port the server listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 42069;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Request parser tuning.
    pub parser: ParserConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Shutdown behaviour of the binary.
    pub shutdown: ShutdownConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:42069").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    /// Listen on every interface at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_address: format!("0.0.0.0:{}", port),
            ..Self::default()
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_connections: 1024,
        }
    }
}

/// Request parser configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Initial read buffer size in bytes. The buffer doubles when full.
    pub initial_buffer_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: crate::http::request::INITIAL_BUFFER_SIZE,
        }
    }
}

/// Log output style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Log output style.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "httpfromtcp=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Seconds to wait for in-flight connections after the listener closes.
    pub grace_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_secs: 5 }
    }
}
