//! DNS Resolution Module
//!
//! A [`PreResolver`] discovers the address of its upstream DNS server at
//! startup (the upstream may itself be a hostname, answered by a bootstrap
//! resolver such as Docker's embedded DNS) and then pins every lookup to it.
//!
//! # Architecture
//!
//! The `Resolve` trait is the engine abstraction. [`EngineFactory`] builds an
//! engine bound to one server address; [`HickoryFactory`] does so with
//! hickory-dns. [`Bootstrap`] runs the retry loop and [`PreResolver`] owns the
//! resulting write-once binding.
//!
//! # Example
//!
//! ```rust,ignore
//! use preresolver::dns::PreResolver;
//! use preresolver::config::ResolverConfig;
//!
//! let resolver = PreResolver::new(ResolverConfig::new("dns.internal"));
//! resolver.init().await?;
//! for ip in resolver.lookup("svc.local").await? {
//!     println!("Resolved: {}", ip);
//! }
//! ```

mod bootstrap;
mod events;
mod hickory;
mod preresolver;
mod resolve;

pub use bootstrap::{Bootstrap, BoundResolver, ATTEMPT_TIMEOUT, RETRY_INTERVAL};
pub use events::{EventSink, ResolverEvent, TracingSink};
pub use hickory::{HickoryFactory, HickoryResolver, QUERY_TIMEOUT};
pub use preresolver::{PreResolver, State};
pub use resolve::{Addrs, EngineFactory, Name, Resolve, Resolving};
