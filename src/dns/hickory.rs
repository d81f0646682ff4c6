//! Resolution engine backed by hickory-dns, pinned to one name server.
//!
//! Each [`HickoryResolver`] talks to exactly one DNS server address, over UDP
//! with TCP fallback for truncated answers. Result caching is disabled:
//! every lookup goes to the bound server.

use super::{Addrs, EngineFactory, Name, Resolve, Resolving};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{LookupIpStrategy, NameServerConfigGroup, ResolverConfig},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::{io, net::SocketAddr, sync::Arc, time::Duration};

/// Per-query timeout towards the bound server.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Async DNS resolver bound to a single server.
///
/// # Example
///
/// ```rust,ignore
/// use preresolver::dns::{HickoryResolver, Name, Resolve};
///
/// let resolver = HickoryResolver::bound_to("10.0.0.9:53".parse()?);
/// let addrs = resolver.resolve(Name::new("svc.local")).await?;
/// ```
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: Arc<TokioResolver>,
    server: SocketAddr,
}

impl HickoryResolver {
    /// Creates a resolver that sends every query to `server`.
    ///
    /// No I/O happens until the first lookup.
    pub fn bound_to(server: SocketAddr) -> Self {
        let name_servers =
            NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], name_servers);

        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        let opts = builder.options_mut();
        opts.ip_strategy = LookupIpStrategy::Ipv4thenIpv6;
        opts.timeout = QUERY_TIMEOUT;
        opts.cache_size = 0;

        tracing::debug!(server = %server, "built hickory resolver");

        Self {
            resolver: Arc::new(builder.build()),
            server,
        }
    }

    /// The DNS server this resolver is bound to.
    pub fn server(&self) -> SocketAddr {
        self.server
    }
}

impl std::fmt::Debug for HickoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryResolver")
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let domain = name.as_str();
            tracing::debug!(domain = %domain, server = %resolver.server, "resolving via hickory-dns");

            let lookup = resolver
                .resolver
                .lookup_ip(domain)
                .await
                .map_err(|e| {
                    tracing::debug!(domain = %domain, error = %e, "hickory-dns lookup failed");
                    io::Error::new(io::ErrorKind::NotFound, e.to_string())
                })
                .dns_context(domain)?;

            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();

            if addrs.is_empty() {
                return Err(NetError::dns_failed(
                    domain,
                    io::Error::new(io::ErrorKind::NotFound, "No addresses returned"),
                ));
            }

            tracing::debug!(domain = %domain, count = addrs.len(), "hickory-dns resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

/// Production [`EngineFactory`]: one [`HickoryResolver`] per bound address.
#[derive(Debug, Clone, Copy, Default)]
pub struct HickoryFactory;

impl EngineFactory for HickoryFactory {
    fn bind(&self, server: SocketAddr) -> Arc<dyn Resolve> {
        Arc::new(HickoryResolver::bound_to(server))
    }
}
