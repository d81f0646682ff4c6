//! Core DNS resolution types and traits.
//!
//! This module defines the `Resolve` trait and supporting types that form
//! the foundation of the DNS abstraction layer.

use crate::base::neterror::NetError;
use std::{fmt, future::Future, net::SocketAddr, pin::Pin, sync::Arc};

/// A domain name to resolve into IP addresses.
///
/// This is a lightweight wrapper around a hostname string that provides
/// a type-safe way to pass domain names to resolvers.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`] from any string-like type.
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Alias for an `Iterator` trait object over `SocketAddr`.
pub type Addrs = Box<dyn Iterator<Item = SocketAddr> + Send>;

/// Alias for the `Future` type returned by a DNS resolver.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Addrs, NetError>> + Send>>;

/// A resolution engine.
///
/// Implementations must be thread-safe: one engine is shared by every lookup,
/// dialer and HTTP client derived from a bootstrapped resolver.
///
/// - Resolution is assumed to always be ready (no backpressure).
/// - Uses `&self` for concurrent resolution without mutable access.
/// - Addresses are yielded in the order the engine received them.
pub trait Resolve: Send + Sync {
    /// Resolves a domain name to IP addresses.
    ///
    /// The returned addresses will have port 0; callers should set the
    /// appropriate port based on the target service.
    fn resolve(&self, name: Name) -> Resolving;
}

/// Blanket implementation for Arc-wrapped resolvers.
impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

/// Builds resolution engines bound to a single DNS server address.
///
/// The bootstrap procedure uses one factory for both the transient engine
/// (bound to the bootstrap resolver) and the permanent engine (bound to the
/// resolved upstream).
pub trait EngineFactory: Send + Sync {
    /// Construct an engine that sends every query to `server`.
    ///
    /// Must not perform network I/O.
    fn bind(&self, server: SocketAddr) -> Arc<dyn Resolve>;
}
