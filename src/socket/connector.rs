//! hyper-util connector: dial through the resolver, then TLS for `https`.

use super::dialer::Dialer;
use super::stream::{Conn, SocketType};
use super::tls::TlsConnector;
use crate::base::neterror::NetError;
use futures::future::BoxFuture;
use http::Uri;
use std::task::{Context, Poll};
use tower_service::Service;

#[derive(Clone, Debug)]
pub struct HttpConnector {
    dialer: Dialer,
    tls: TlsConnector,
}

impl HttpConnector {
    pub fn new(dialer: Dialer, tls: TlsConnector) -> Self {
        Self { dialer, tls }
    }

    pub fn dialer(&self) -> &Dialer {
        &self.dialer
    }

    /// Open a connection suitable for requests to `uri`.
    pub async fn connect(&self, uri: &Uri) -> Result<Conn, NetError> {
        let https = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            Some(_) => return Err(NetError::DisallowedUrlScheme),
            None => return Err(NetError::InvalidUrl),
        };
        let host = uri.host().ok_or(NetError::InvalidUrl)?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let port = uri.port_u16().unwrap_or(if https { 443 } else { 80 });

        let tcp = self.dialer.connect(host, port).await?;
        if !https {
            return Ok(Conn::new(SocketType::Tcp(tcp)));
        }

        let tls = self.tls.connect(host, tcp).await?;
        tracing::debug!(host = %host, port, "TLS established");
        Ok(Conn::new(SocketType::Ssl(tls)))
    }
}

impl Service<Uri> for HttpConnector {
    type Response = Conn;
    type Error = NetError;
    type Future = BoxFuture<'static, Result<Conn, NetError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { this.connect(&uri).await })
    }
}
