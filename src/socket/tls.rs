use crate::base::neterror::NetError;
use boring::ssl::{SslConnector, SslConnectorBuilder, SslMethod, SslVerifyMode, SslVersion};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_boring::SslStream;

/// Client TLS settings for resolver-derived HTTP clients.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub alpn_protos: Vec<String>,
    /// Verify the peer chain and hostname. Off means any certificate is accepted.
    pub verify_certificates: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            alpn_protos: vec!["http/1.1".to_string()],
            verify_certificates: true,
        }
    }
}

impl TlsConfig {
    /// Default settings with certificate verification switched off.
    pub fn insecure() -> Self {
        Self {
            verify_certificates: false,
            ..Self::default()
        }
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder.set_min_proto_version(Some(min)).map_err(|_| NetError::SslProtocolError)?;
        }
        if let Some(max) = self.max_version {
            builder.set_max_proto_version(Some(max)).map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.alpn_protos.is_empty() {
            let mut alpn_wire = Vec::new();
            for proto in &self.alpn_protos {
                if proto.len() > 255 {
                    return Err(NetError::SslProtocolError);
                }
                alpn_wire.push(proto.len() as u8);
                alpn_wire.extend_from_slice(proto.as_bytes());
            }
            builder.set_alpn_protos(&alpn_wire).map_err(|_| NetError::SslProtocolError)?;
        }

        if self.verify_certificates {
            builder.set_default_verify_paths().map_err(|_| NetError::SslProtocolError)?;
            builder.set_verify(SslVerifyMode::PEER);
        } else {
            builder.set_verify(SslVerifyMode::NONE);
        }

        Ok(())
    }

    /// Check if SNI (Server Name Indication) should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_err()
    }
}

/// Performs client handshakes with a prebuilt BoringSSL context.
#[derive(Clone)]
pub struct TlsConnector {
    connector: SslConnector,
    verify: bool,
}

impl TlsConnector {
    pub fn new(config: &TlsConfig) -> Result<Self, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        config.apply_to_builder(&mut builder)?;
        Ok(Self {
            connector: builder.build(),
            verify: config.verify_certificates,
        })
    }

    pub fn verifies_certificates(&self) -> bool {
        self.verify
    }

    /// Handshake over `stream` for `host`.
    pub async fn connect<S>(&self, host: &str, stream: S) -> Result<SslStream<S>, NetError>
    where
        S: AsyncRead + AsyncWrite + Unpin + std::fmt::Debug,
    {
        let mut config = self.connector.configure().map_err(|_| NetError::SslProtocolError)?;
        config.set_use_server_name_indication(TlsConfig::should_set_sni(host));
        if !self.verify {
            config.set_verify_hostname(false);
            config.set_verify(SslVerifyMode::NONE);
        }

        tokio_boring::connect(config, host, stream).await.map_err(|e| {
            tracing::debug!(host = %host, error = %e, "TLS handshake failed");
            NetError::SslHandshakeFailed(e.to_string())
        })
    }
}

impl std::fmt::Debug for TlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnector").field("verify", &self.verify).finish_non_exhaustive()
    }
}
