//! # preresolver
//!
//! A DNS resolver that bootstraps itself at process startup.
//!
//! In container deployments the DNS server a service should use is often
//! addressed by name (`dns.internal`), which itself has to be resolved first.
//! `preresolver` looks that name up once through a bootstrap resolver (Docker's
//! embedded `127.0.0.11:53` by default), retrying for a startup window, and then
//! pins every lookup, TCP dial and HTTP request to the server it found.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use preresolver::{PreResolver, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), preresolver::NetError> {
//!     let resolver = PreResolver::new(ResolverConfig::from_env("APP")?);
//!     resolver.init().await?;
//!
//!     let ips = resolver.lookup("svc.local").await?;
//!     let stream = resolver.dialer()?.dial("svc.local:6379").await?;
//!     let resp = resolver.http_client()?.get("https://svc.local/health").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error type and context helpers
//! - [`config`] - Settings, environment and secret-file loading
//! - [`dns`] - Bootstrap, resolution engines and the resolver handle
//! - [`socket`] - Dialer, TLS and the HTTP connector
//! - [`client`] - HTTP client over the bound resolver
//! - [`process`] - Opt-in zombie reaper for PID 1 containers

pub mod base;
pub mod client;
pub mod config;
pub mod dns;
pub mod process;
pub mod socket;

pub use base::neterror::NetError;
pub use client::HttpClient;
pub use config::{ConfigLoader, ResolverConfig};
pub use dns::{PreResolver, State};
pub use socket::dialer::Dialer;
