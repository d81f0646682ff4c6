//! Verbose diagnostic events.
//!
//! The resolver reports bootstrap progress and lookups through an
//! [`EventSink`] only when [`verbose`](crate::config::ResolverConfig::verbose)
//! is set. [`TracingSink`] is the default and forwards to `tracing`.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverEvent {
    /// A bootstrap attempt is starting.
    BootstrapAttempt {
        upstream: String,
        attempt: u64,
        max_attempts: u64,
    },
    /// The upstream hostname was resolved through the bootstrap resolver.
    UpstreamResolved {
        upstream: String,
        via: SocketAddr,
        address: SocketAddr,
    },
    BootstrapFailed {
        upstream: String,
        attempt: u64,
        error: String,
    },
    /// The permanent engine was published.
    Initialized { bound: SocketAddr, attempts: u64 },
    /// A lookup completed. `first` is `None` for an empty answer.
    Lookup {
        domain: String,
        first: Option<IpAddr>,
        count: usize,
    },
}

impl fmt::Display for ResolverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverEvent::BootstrapAttempt {
                upstream,
                attempt,
                max_attempts,
            } => write!(f, "resolving {upstream} (attempt {attempt}/{max_attempts})"),
            ResolverEvent::UpstreamResolved {
                upstream,
                via,
                address,
            } => write!(f, "{upstream} is {address} (via {via})"),
            ResolverEvent::BootstrapFailed {
                upstream,
                attempt,
                error,
            } => write!(f, "Can't get resolver for {upstream} (attempt {attempt}): {error}"),
            ResolverEvent::Initialized { bound, attempts } => {
                write!(f, "Resolver initialized with {bound} after {attempts} attempt(s)")
            }
            ResolverEvent::Lookup {
                domain,
                first: Some(ip),
                ..
            } => write!(f, "{domain} is {ip}"),
            ResolverEvent::Lookup { domain, first: None, .. } => {
                write!(f, "{domain} has no addresses")
            }
        }
    }
}

/// Receives verbose resolver events.
pub trait EventSink: Send + Sync {
    fn log_event(&self, event: &ResolverEvent);
}

/// Default sink: one `tracing` record per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn log_event(&self, event: &ResolverEvent) {
        match event {
            ResolverEvent::BootstrapFailed { .. } => tracing::warn!(target: "preresolver", "{event}"),
            _ => tracing::info!(target: "preresolver", "{event}"),
        }
    }
}
