//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into context-rich `NetError` variants.

use crate::base::neterror::NetError;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use preresolver::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).await
    ///     .connection_context("10.0.0.9", 53)?;
    /// // Error: "Connection to 10.0.0.9:53 failed: connection refused"
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// Add DNS resolution context to an IO error.
    fn dns_context(self, domain: &str) -> Result<T, NetError>;

    /// Add secret-file context to an IO error.
    fn secret_context(self, path: &std::path::Path) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| NetError::connection_failed_to(host, port, e))
    }

    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(domain, e))
    }

    fn secret_context(self, path: &std::path::Path) -> Result<T, NetError> {
        self.map_err(|e| NetError::secret_unreadable(path.display().to_string(), e))
    }
}
