//! TCP dialer that resolves host names through a bound resolver.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::config::Endpoint;
use crate::dns::{Name, Resolve};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Bound on resolution plus connect for one dial.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens TCP connections, resolving names through a shared engine.
///
/// Literal IP hosts are dialed directly. Resolved addresses are tried in the
/// order the engine returned them until one connects.
#[derive(Clone)]
pub struct Dialer {
    resolver: Arc<dyn Resolve>,
    timeout: Duration,
}

impl Dialer {
    pub fn new(resolver: Arc<dyn Resolve>) -> Self {
        Self {
            resolver,
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Dial a `host:port` string.
    pub async fn dial(&self, address: &str) -> Result<TcpStream, NetError> {
        match Endpoint::parse_with_default_port(address, 0)? {
            Endpoint::Addr(addr) if addr.port() != 0 => {
                self.connect(&addr.ip().to_string(), addr.port()).await
            }
            Endpoint::Host { host, port } if port != 0 => self.connect(&host, port).await,
            _ => Err(NetError::InvalidAddress(format!("{address}: missing port"))),
        }
    }

    /// Connect to `host` on `port`.
    pub async fn connect(&self, host: &str, port: u16) -> Result<TcpStream, NetError> {
        let fut = async {
            let addrs = self.resolve(host, port).await?;
            self.connect_each(host, port, addrs).await
        };
        tokio::time::timeout(self.timeout, fut).await.map_err(|_| {
            tracing::debug!(host = %host, port, timeout = ?self.timeout, "dial timed out");
            NetError::ConnectionTimedOut
        })?
    }

    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, NetError> {
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, port)]);
        }

        let addrs: Vec<SocketAddr> = self
            .resolver
            .resolve(Name::new(host))
            .await?
            .map(|mut addr| {
                addr.set_port(port);
                addr
            })
            .collect();
        tracing::trace!(host = %host, count = addrs.len(), "dialer resolved host");
        Ok(addrs)
    }

    async fn connect_each(
        &self,
        host: &str,
        port: u16,
        addrs: Vec<SocketAddr>,
    ) -> Result<TcpStream, NetError> {
        let mut last_err =
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses to connect to");

        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    let _ = stream.set_nodelay(true);
                    tracing::debug!(host = %host, addr = %addr, "connected");
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(host = %host, addr = %addr, error = %e, "connect attempt failed");
                    last_err = e;
                }
            }
        }

        Err(last_err).connection_context(host, port)
    }
}

impl std::fmt::Debug for Dialer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialer").field("timeout", &self.timeout).finish_non_exhaustive()
    }
}
