//! The self-bootstrapping resolver handle.

use super::bootstrap::{Bootstrap, BoundResolver};
use super::events::{EventSink, ResolverEvent, TracingSink};
use super::hickory::HickoryFactory;
use super::{EngineFactory, Name, Resolve};
use crate::base::neterror::NetError;
use crate::client::HttpClient;
use crate::config::ResolverConfig;
use crate::socket::dialer::Dialer;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

/// Lifecycle of a [`PreResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Failed = 3,
}

impl State {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => State::Initializing,
            2 => State::Ready,
            3 => State::Failed,
            _ => State::Uninitialized,
        }
    }
}

/// A DNS resolver that finds its own upstream server at startup.
///
/// Call [`init`](Self::init) once; afterwards [`lookup`](Self::lookup),
/// [`dialer`](Self::dialer) and [`http_client`](Self::http_client) all go
/// through the same engine, bound to one address for the life of the handle.
///
/// # Example
///
/// ```rust,ignore
/// use preresolver::{PreResolver, ResolverConfig};
///
/// let resolver = PreResolver::new(ResolverConfig::new("dns.internal"));
/// resolver.init().await?;
/// let ips = resolver.lookup("svc.local").await?;
/// ```
pub struct PreResolver {
    config: ResolverConfig,
    factory: Arc<dyn EngineFactory>,
    events: Arc<dyn EventSink>,
    state: AtomicU8,
    bound: OnceLock<BoundResolver>,
}

impl PreResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_factory(config, Arc::new(HickoryFactory))
    }

    /// Use a custom engine factory instead of hickory-dns.
    pub fn with_factory(config: ResolverConfig, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            config,
            factory,
            events: Arc::new(TracingSink),
            state: AtomicU8::new(State::Uninitialized as u8),
            bound: OnceLock::new(),
        }
    }

    /// Replace the sink receiving verbose events.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Bootstrap the resolver.
    ///
    /// Returns immediately when already ready. Fails with
    /// [`NetError::BootstrapInProgress`] while another call is running. A
    /// failed run leaves the handle unusable until `init` is called again.
    pub async fn init(&self) -> Result<(), NetError> {
        if self.bound.get().is_some() {
            return Ok(());
        }

        let current = self.state.load(Ordering::Acquire);
        match State::from_u8(current) {
            State::Ready => return Ok(()),
            State::Initializing => return Err(NetError::BootstrapInProgress),
            State::Uninitialized | State::Failed => {}
        }
        if self
            .state
            .compare_exchange(
                current,
                State::Initializing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(NetError::BootstrapInProgress);
        }

        let mut guard = InitGuard {
            state: &self.state,
            done: false,
        };

        let result = Bootstrap::new(&self.config, self.factory.as_ref())
            .with_events(self.sink())
            .run()
            .await;

        guard.done = true;
        match result {
            Ok(bound) => {
                let _ = self.bound.set(bound);
                self.state.store(State::Ready as u8, Ordering::Release);
                Ok(())
            }
            Err(e) => {
                self.state.store(State::Failed as u8, Ordering::Release);
                Err(e)
            }
        }
    }

    fn sink(&self) -> Option<&dyn EventSink> {
        self.config.verbose.then_some(self.events.as_ref())
    }

    fn bound(&self) -> Result<&BoundResolver, NetError> {
        self.bound.get().ok_or(NetError::NotInitialized)
    }

    /// The address the engine is bound to, once ready.
    pub fn bound_address(&self) -> Option<SocketAddr> {
        self.bound.get().map(BoundResolver::address)
    }

    /// The shared engine, for collaborators that take a [`Resolve`].
    pub fn engine(&self) -> Result<Arc<dyn Resolve>, NetError> {
        Ok(self.bound()?.engine().clone())
    }

    /// Resolve `domain` through the bound server.
    ///
    /// Addresses come back in the order the server sent them.
    pub async fn lookup(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        let bound = self.bound()?;
        let ips: Vec<IpAddr> = bound
            .engine()
            .resolve(Name::new(domain))
            .await?
            .map(|addr| addr.ip())
            .collect();

        if let Some(sink) = self.sink() {
            sink.log_event(&ResolverEvent::Lookup {
                domain: domain.to_string(),
                first: ips.first().copied(),
                count: ips.len(),
            });
        }
        Ok(ips)
    }

    /// A TCP dialer that resolves through the bound server.
    pub fn dialer(&self) -> Result<Dialer, NetError> {
        Ok(Dialer::new(self.engine()?))
    }

    /// An HTTP client whose connections are dialed through [`dialer`](Self::dialer).
    pub fn http_client(&self) -> Result<HttpClient, NetError> {
        HttpClient::new(self.dialer()?, self.config.insecure_tls)
    }
}

impl std::fmt::Debug for PreResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreResolver")
            .field("upstream", &self.config.upstream)
            .field("state", &self.state())
            .field("bound", &self.bound_address())
            .finish()
    }
}

/// Marks the run failed if the `init` future is dropped mid-bootstrap.
struct InitGuard<'a> {
    state: &'a AtomicU8,
    done: bool,
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.state.store(State::Failed as u8, Ordering::Release);
        }
    }
}
