//! Shared fixtures: a scripted UDP DNS server and a self-signed TLS server.

#![allow(dead_code)]

use boring::asn1::Asn1Time;
use boring::bn::BigNum;
use boring::hash::MessageDigest;
use boring::pkey::{PKey, Private};
use boring::rsa::Rsa;
use boring::ssl::{SslAcceptor, SslMethod};
use boring::x509::{X509NameBuilder, X509};
use hickory_resolver::proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_resolver::proto::rr::rdata::A;
use hickory_resolver::proto::rr::{RData, Record, RecordType};
use preresolver::dns::{EngineFactory, HickoryFactory, Resolve};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;

/// A UDP DNS server answering A queries from a fixed table.
///
/// Unknown names get NXDOMAIN; known names get an empty answer for other types.
pub struct MockDns {
    pub addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl MockDns {
    pub async fn start(records: &[(&str, &[Ipv4Addr])]) -> Self {
        let table: HashMap<String, Vec<Ipv4Addr>> = records
            .iter()
            .map(|(name, ips)| (normalize(name), ips.to_vec()))
            .collect();
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let queries = Arc::new(AtomicUsize::new(0));

        let counter = queries.clone();
        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let Ok(request) = Message::from_vec(&buf[..len]) else {
                    continue;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                if let Ok(bytes) = answer(&table, &request).to_vec() {
                    let _ = socket.send_to(&bytes, peer).await;
                }
            }
        });

        Self {
            addr,
            queries,
            task,
        }
    }

    /// Number of well-formed queries received so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl Drop for MockDns {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

fn answer(table: &HashMap<String, Vec<Ipv4Addr>>, request: &Message) -> Message {
    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(request.recursion_desired())
        .set_recursion_available(true);
    response.add_queries(request.queries().to_vec());

    let mut code = ResponseCode::NoError;
    for query in request.queries() {
        match table.get(&normalize(&query.name().to_string())) {
            Some(ips) if query.query_type() == RecordType::A => {
                for ip in ips {
                    response.add_answer(Record::from_rdata(
                        query.name().clone(),
                        60,
                        RData::A(A(*ip)),
                    ));
                }
            }
            Some(_) => {}
            None => code = ResponseCode::NXDomain,
        }
    }
    response.set_response_code(code);
    response
}

/// Wraps [`HickoryFactory`] and records every address an engine is bound to.
#[derive(Default)]
pub struct RecordingFactory {
    binds: Mutex<Vec<SocketAddr>>,
}

impl RecordingFactory {
    pub fn binds(&self) -> Vec<SocketAddr> {
        self.binds.lock().unwrap().clone()
    }
}

impl EngineFactory for RecordingFactory {
    fn bind(&self, server: SocketAddr) -> Arc<dyn Resolve> {
        self.binds.lock().unwrap().push(server);
        HickoryFactory.bind(server)
    }
}

fn self_signed() -> (PKey<Private>, X509) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "svc.local").unwrap();
    let name = name.build();

    let mut cert = X509::builder().unwrap();
    cert.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    cert.set_serial_number(&serial).unwrap();
    cert.set_subject_name(&name).unwrap();
    cert.set_issuer_name(&name).unwrap();
    cert.set_pubkey(&key).unwrap();
    cert.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    cert.set_not_after(&Asn1Time::days_from_now(1).unwrap()).unwrap();
    cert.sign(&key, MessageDigest::sha256()).unwrap();

    (key, cert.build())
}

/// An HTTPS server with a self-signed certificate answering `200 ok` to anything.
pub struct TlsServer {
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TlsServer {
    pub async fn start() -> Self {
        let (key, cert) = self_signed();
        let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
        acceptor.set_private_key(&key).unwrap();
        acceptor.set_certificate(&cert).unwrap();
        let acceptor = Arc::new(acceptor.build());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            loop {
                let Ok((tcp, _)) = listener.accept().await else {
                    return;
                };
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    // A rejecting client aborts the handshake; nothing to serve then.
                    if let Ok(mut tls) = tokio_boring::accept(&acceptor, tcp).await {
                        respond_ok(&mut tls).await;
                    }
                });
            }
        });

        Self { addr, task }
    }
}

impl Drop for TlsServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A plain HTTP server answering `200 ok` to anything.
pub struct HttpServer {
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl HttpServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            loop {
                let Ok((mut tcp, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move { respond_ok(&mut tcp).await });
            }
        });
        Self { addr, task }
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn respond_ok<S>(stream: &mut S)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let _ = stream
        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
        .await;
    let _ = stream.shutdown().await;
}
