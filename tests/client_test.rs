//! Dialer and HTTP client derived from a bootstrapped resolver.

mod support;

use http_body_util::BodyExt;
use preresolver::{NetError, PreResolver, ResolverConfig};
use std::net::Ipv4Addr;
use support::{HttpServer, MockDns, TlsServer};

async fn resolver_for(dns: &MockDns, insecure: bool) -> PreResolver {
    let config = ResolverConfig::new(dns.addr.to_string()).with_insecure_tls(insecure);
    let resolver = PreResolver::new(config);
    resolver.init().await.unwrap();
    resolver
}

#[tokio::test]
async fn test_derived_handles_require_init() {
    let resolver = PreResolver::new(ResolverConfig::new("10.0.0.5"));
    assert!(resolver.dialer().unwrap_err().is_not_initialized());
    assert!(resolver.http_client().unwrap_err().is_not_initialized());
}

#[tokio::test]
async fn test_dialer_resolves_through_bound_server() {
    let server = HttpServer::start().await;
    let dns = MockDns::start(&[("svc.local", &[Ipv4Addr::LOCALHOST])]).await;
    let resolver = resolver_for(&dns, false).await;

    let dialer = resolver.dialer().unwrap();
    let stream = dialer
        .dial(&format!("svc.local:{}", server.addr.port()))
        .await
        .unwrap();
    assert_eq!(stream.peer_addr().unwrap(), server.addr);
    assert!(dns.queries() >= 1);
}

#[tokio::test]
async fn test_plain_http_get() {
    let server = HttpServer::start().await;
    let dns = MockDns::start(&[("svc.local", &[Ipv4Addr::LOCALHOST])]).await;
    let client = resolver_for(&dns, false).await.http_client().unwrap();

    let resp = client
        .get(&format!("http://svc.local:{}/health", server.addr.port()))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_insecure_client_accepts_self_signed() {
    let server = TlsServer::start().await;
    let dns = MockDns::start(&[("svc.local", &[Ipv4Addr::LOCALHOST])]).await;
    let client = resolver_for(&dns, true).await.http_client().unwrap();
    assert!(client.is_insecure());

    let resp = client
        .get(&format!("https://svc.local:{}/", server.addr.port()))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_secure_client_rejects_self_signed() {
    let server = TlsServer::start().await;
    let dns = MockDns::start(&[("svc.local", &[Ipv4Addr::LOCALHOST])]).await;
    let client = resolver_for(&dns, false).await.http_client().unwrap();
    assert!(!client.is_insecure());

    let err = client
        .get(&format!("https://svc.local:{}/", server.addr.port()))
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::SslHandshakeFailed(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unresolvable_host_surfaces_dns_error() {
    let dns = MockDns::start(&[]).await;
    let client = resolver_for(&dns, false).await.http_client().unwrap();

    let err = client.get("http://missing.local/").await.unwrap_err();
    assert!(err.is_dns(), "got {err:?}");
}

#[tokio::test]
async fn test_rejects_non_http_urls() {
    let dns = MockDns::start(&[]).await;
    let client = resolver_for(&dns, false).await.http_client().unwrap();

    assert!(matches!(
        client.get("ftp://svc.local/").await,
        Err(NetError::DisallowedUrlScheme)
    ));
    assert!(matches!(client.get("::not a url").await, Err(NetError::InvalidUrl)));
}
