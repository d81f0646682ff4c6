use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Resolver lifecycle
    #[error("Resolver not initialized")]
    NotInitialized,
    #[error("Resolver bootstrap already in progress")]
    BootstrapInProgress,
    #[error("Can't get resolver for {upstream} after {attempts} attempt(s)")]
    BootstrapExhausted { upstream: String, attempts: u64 },

    // Name resolution
    #[error("Name not resolved: {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },

    // Connection Errors
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Address invalid: {0}")]
    InvalidAddress(String),

    // TLS
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("SSL handshake failed: {0}")]
    SslHandshakeFailed(String),

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,
    #[error("HTTP request failed: {0}")]
    HttpRequestFailed(String),

    // Configuration
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },
    #[error("Failed to read secret {path}: {source}")]
    SecretUnreadable {
        path: String,
        #[source]
        source: Arc<io::Error>,
    },
}

impl NetError {
    /// Chromium-compatible error code where one exists, custom codes otherwise.
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionFailedTo { .. } => -104,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError => -107,
            NetError::InvalidAddress(_) => -108,
            NetError::ConnectionTimedOut => -118,
            NetError::SslHandshakeFailed(_) => -200,
            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            NetError::HttpRequestFailed(_) => -320,
            // Resolver lifecycle errors (custom codes starting at -1000)
            NetError::NotInitialized => -1000,
            NetError::BootstrapInProgress => -1001,
            NetError::BootstrapExhausted { .. } => -1002,
            NetError::InvalidConfig { .. } => -1003,
            NetError::SecretUnreadable { .. } => -1004,
        }
    }

    /// Returns true if the error came from calling into a resolver that has
    /// not finished bootstrapping.
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, NetError::NotInitialized)
    }

    /// Returns true for errors produced by name resolution.
    pub fn is_dns(&self) -> bool {
        matches!(self, NetError::NameNotResolvedFor { .. })
    }

    pub fn dns_failed(domain: impl Into<String>, source: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.into(),
            source: Arc::new(source),
        }
    }

    pub fn connection_failed_to(host: impl Into<String>, port: u16, source: io::Error) -> Self {
        NetError::ConnectionFailedTo {
            host: host.into(),
            port,
            source: Arc::new(source),
        }
    }

    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        NetError::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn secret_unreadable(path: impl Into<String>, source: io::Error) -> Self {
        NetError::SecretUnreadable {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}
