//! Bootstrap: find the upstream DNS server's address and bind an engine to it.
//!
//! A literal upstream is bound directly. A hostname upstream is looked up once
//! per attempt through a transient engine bound to the bootstrap resolver;
//! the first returned address wins. Attempts repeat once per second until
//! the startup window runs out.

use super::events::{EventSink, ResolverEvent};
use super::{EngineFactory, Name, Resolve};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::config::{Endpoint, ResolverConfig};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Pause between failed attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on one attempt's lookup, however slow the bootstrap server is.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// A permanent engine and the address it is bound to.
#[derive(Clone)]
pub struct BoundResolver {
    address: SocketAddr,
    engine: Arc<dyn Resolve>,
}

impl BoundResolver {
    pub fn new(address: SocketAddr, engine: Arc<dyn Resolve>) -> Self {
        Self { address, engine }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn engine(&self) -> &Arc<dyn Resolve> {
        &self.engine
    }
}

impl std::fmt::Debug for BoundResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundResolver")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// One bootstrap run over a config.
pub struct Bootstrap<'a> {
    config: &'a ResolverConfig,
    factory: &'a dyn EngineFactory,
    events: Option<&'a dyn EventSink>,
}

impl<'a> Bootstrap<'a> {
    pub fn new(config: &'a ResolverConfig, factory: &'a dyn EngineFactory) -> Self {
        Self {
            config,
            factory,
            events: None,
        }
    }

    /// Report progress to `sink`.
    pub fn with_events(mut self, sink: Option<&'a dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    fn emit(&self, event: ResolverEvent) {
        if let Some(sink) = self.events {
            sink.log_event(&event);
        }
    }

    /// Run attempts until one succeeds or the window is exhausted.
    ///
    /// Malformed addresses fail immediately without retrying. The bootstrap
    /// address is only read when the upstream is a hostname.
    pub async fn run(&self) -> Result<BoundResolver, NetError> {
        let upstream = Endpoint::parse(&self.config.upstream)?;
        let bootstrap = match upstream {
            Endpoint::Addr(_) => None,
            Endpoint::Host { .. } => Some(Endpoint::parse(&self.config.bootstrap_address)?),
        };
        let max_attempts = self.config.bootstrap_attempts();
        let label = upstream.to_string();

        for attempt in 1..=max_attempts {
            tracing::debug!(upstream = %label, attempt, max_attempts, "bootstrap attempt");
            self.emit(ResolverEvent::BootstrapAttempt {
                upstream: label.clone(),
                attempt,
                max_attempts,
            });

            let outcome = tokio::time::timeout(
                ATTEMPT_TIMEOUT,
                self.resolve_target(&upstream, bootstrap.as_ref()),
            )
            .await
            .unwrap_or_else(|_| {
                Err(NetError::dns_failed(
                    label.as_str(),
                    io::Error::new(io::ErrorKind::TimedOut, "bootstrap lookup timed out"),
                ))
            });

            match outcome {
                Ok(target) => {
                    let engine = self.factory.bind(target);
                    tracing::debug!(upstream = %label, bound = %target, attempt, "resolver bootstrapped");
                    self.emit(ResolverEvent::Initialized {
                        bound: target,
                        attempts: attempt,
                    });
                    return Ok(BoundResolver::new(target, engine));
                }
                Err(e) => {
                    tracing::debug!(upstream = %label, attempt, error = %e, "bootstrap attempt failed");
                    self.emit(ResolverEvent::BootstrapFailed {
                        upstream: label.clone(),
                        attempt,
                        error: e.to_string(),
                    });
                    if attempt < max_attempts {
                        tokio::time::sleep(RETRY_INTERVAL).await;
                    }
                }
            }
        }

        Err(NetError::BootstrapExhausted {
            upstream: label,
            attempts: max_attempts,
        })
    }

    /// The address the permanent engine should be bound to.
    async fn resolve_target(
        &self,
        upstream: &Endpoint,
        bootstrap: Option<&Endpoint>,
    ) -> Result<SocketAddr, NetError> {
        let (host, port, bootstrap) = match (upstream, bootstrap) {
            (Endpoint::Addr(addr), _) => return Ok(*addr),
            (Endpoint::Host { host, port }, Some(bootstrap)) => (host.as_str(), *port, bootstrap),
            (Endpoint::Host { .. }, None) => {
                return Err(NetError::InvalidAddress("no bootstrap resolver".into()))
            }
        };

        let via = bootstrap_server(bootstrap).await?;
        let transient = self.factory.bind(via);
        let mut addrs = transient.resolve(Name::new(host)).await?;
        let first = addrs.next().ok_or_else(|| {
            NetError::dns_failed(
                host,
                io::Error::new(io::ErrorKind::NotFound, "No addresses returned"),
            )
        })?;

        let target = SocketAddr::new(first.ip(), port);
        self.emit(ResolverEvent::UpstreamResolved {
            upstream: upstream.to_string(),
            via,
            address: target,
        });
        Ok(target)
    }
}

/// The bootstrap resolver's address. A hostname goes through the system resolver.
async fn bootstrap_server(bootstrap: &Endpoint) -> Result<SocketAddr, NetError> {
    match bootstrap {
        Endpoint::Addr(addr) => Ok(*addr),
        Endpoint::Host { host, port } => {
            let mut addrs = tokio::net::lookup_host((host.as_str(), *port))
                .await
                .dns_context(host)?;
            addrs.next().ok_or_else(|| {
                NetError::dns_failed(
                    host.as_str(),
                    io::Error::new(io::ErrorKind::NotFound, "No addresses returned"),
                )
            })
        }
    }
}
