//! HTTP client whose connections resolve through a bootstrapped resolver.
//!
//! # Example
//!
//! ```rust,ignore
//! use preresolver::{PreResolver, ResolverConfig};
//!
//! let resolver = PreResolver::new(ResolverConfig::new("dns.internal"));
//! resolver.init().await?;
//!
//! let client = resolver.http_client()?;
//! let resp = client.get("https://svc.local/health").await?;
//! println!("Status: {}", resp.status());
//! ```

use crate::base::neterror::NetError;
use crate::socket::connector::HttpConnector;
use crate::socket::dialer::Dialer;
use crate::socket::tls::{TlsConfig, TlsConnector};
use bytes::Bytes;
use http::{Request, Response, Uri};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use url::Url;

/// How long an idle pooled connection is kept.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Pooled HTTP/1.1 client over [`HttpConnector`].
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client<HttpConnector, Full<Bytes>>,
    insecure: bool,
}

impl HttpClient {
    /// Build a client dialing through `dialer`.
    ///
    /// With `insecure` set, TLS peers are accepted without certificate or
    /// hostname verification.
    pub fn new(dialer: Dialer, insecure: bool) -> Result<Self, NetError> {
        let tls_config = if insecure {
            tracing::warn!("TLS certificate verification disabled");
            TlsConfig::insecure()
        } else {
            TlsConfig::default()
        };
        let connector = HttpConnector::new(dialer, TlsConnector::new(&tls_config)?);
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build(connector);

        Ok(Self { inner, insecure })
    }

    pub fn is_insecure(&self) -> bool {
        self.insecure
    }

    /// GET `url`.
    pub async fn get(&self, url: &str) -> Result<Response<Incoming>, NetError> {
        let uri = parse_url(url)?;
        let req = Request::get(uri)
            .body(Full::default())
            .map_err(|_| NetError::InvalidUrl)?;
        self.request(req).await
    }

    /// Send a prepared request. The response body is returned unread.
    pub async fn request(&self, req: Request<Full<Bytes>>) -> Result<Response<Incoming>, NetError> {
        let uri = req.uri().clone();
        tracing::debug!(method = %req.method(), uri = %uri, "sending request");

        self.inner.request(req).await.map_err(|e| {
            tracing::debug!(uri = %uri, error = %e, "request failed");
            unwrap_error(&e)
        })
    }
}

/// Validate an http(s) URL and convert it for hyper.
fn parse_url(url: &str) -> Result<Uri, NetError> {
    let url = Url::parse(url).map_err(|_| NetError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(NetError::DisallowedUrlScheme),
    }
    if url.host_str().is_none() {
        return Err(NetError::InvalidUrl);
    }
    url.as_str().parse::<Uri>().map_err(|_| NetError::InvalidUrl)
}

/// Surface our own connector error when hyper-util wraps one.
fn unwrap_error(err: &hyper_util::client::legacy::Error) -> NetError {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(net) = cause.downcast_ref::<NetError>() {
            return net.clone();
        }
        source = cause.source();
    }
    NetError::HttpRequestFailed(err.to_string())
}
