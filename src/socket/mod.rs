//! Socket and connection management.
//!
//! - [`dialer`]: TCP dialing through the bound resolver (5s timeout)
//! - [`tls`]: TLS configuration with BoringSSL
//! - [`stream`]: plain/TLS sockets adapted to hyper
//! - [`connector`]: the hyper-util connector tying them together

pub mod connector;
pub mod dialer;
pub mod stream;
pub mod tls;
