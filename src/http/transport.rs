//! Raw socket transport
//!
//! Every request gets a fresh TCP connection (optionally wrapped in TLS),
//! one write of the rendered request, one framed response, and a close.
//! Nothing here looks at status codes; that is the fetcher's job.

use crate::config::{CrawlerConfig, ServerConfig};
use crate::http::request::Request;
use crate::http::response::{read_response, RawResponse};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

/// Errors raised while exchanging one request/response pair
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TLS server name: {0}")]
    InvalidServerName(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Response body truncated: expected {expected} bytes, received {received}")]
    Truncated { expected: usize, received: usize },

    #[error("Failed to decompress gzip body: {0}")]
    Decompress(std::io::Error),

    #[error("Unsupported response framing: {0}")]
    Unsupported(String),
}

/// Sends one request and returns one framed response
///
/// Implementations must be shareable across worker tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<RawResponse, TransportError>;
}

/// Transport over a fresh TCP (or TLS) connection per request
pub struct TcpTransport {
    host: String,
    port: u16,
    tls: Option<(TlsConnector, ServerName<'static>)>,
    chunk_size: usize,
    connect_retry_delay: Duration,
}

impl TcpTransport {
    /// Creates a transport for the configured server
    ///
    /// # Returns
    ///
    /// * `Ok(TcpTransport)` - Ready to send
    /// * `Err(TransportError)` - The host is not a valid TLS server name
    pub fn new(server: &ServerConfig, crawler: &CrawlerConfig) -> Result<Self, TransportError> {
        let tls = if server.tls {
            let server_name = ServerName::try_from(server.host.clone())
                .map_err(|e| TransportError::InvalidServerName(format!("{}: {}", server.host, e)))?;
            Some((build_tls_connector(), server_name))
        } else {
            None
        };

        Ok(Self {
            host: server.host.clone(),
            port: server.port,
            tls,
            chunk_size: crawler.read_chunk_size,
            connect_retry_delay: Duration::from_millis(server.connect_retry_delay_ms),
        })
    }

    /// Opens a TCP connection, retrying until it succeeds
    ///
    /// Refused or reset connections are expected under load, so there is no
    /// attempt limit; only a constant delay between attempts.
    async fn connect(&self) -> TcpStream {
        let mut attempts: u64 = 0;
        loop {
            match TcpStream::connect((self.host.as_str(), self.port)).await {
                Ok(stream) => {
                    if attempts > 0 {
                        tracing::debug!(
                            "Connected to {}:{} after {} failed attempts",
                            self.host,
                            self.port,
                            attempts
                        );
                    }
                    return stream;
                }
                Err(e) => {
                    attempts += 1;
                    tracing::trace!("Connect to {}:{} failed: {}", self.host, self.port, e);
                    if !self.connect_retry_delay.is_zero() {
                        tokio::time::sleep(self.connect_retry_delay).await;
                    }
                }
            }
        }
    }

    /// One full attempt: connect, handshake, write, read, close
    async fn exchange(&self, request: &[u8]) -> Result<RawResponse, TransportError> {
        loop {
            let stream = self.connect().await;
            match &self.tls {
                Some((connector, server_name)) => {
                    // A failed handshake is a connection failure and is retried like one.
                    let tls_stream = match connector.connect(server_name.clone(), stream).await {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::trace!("TLS handshake with {} failed: {}", self.host, e);
                            if !self.connect_retry_delay.is_zero() {
                                tokio::time::sleep(self.connect_retry_delay).await;
                            }
                            continue;
                        }
                    };
                    return exchange_on(tls_stream, request, self.chunk_size).await;
                }
                None => return exchange_on(stream, request, self.chunk_size).await,
            }
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    /// Sends the request, retrying the whole exchange once on failure
    async fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let text = request.render();
        tracing::trace!("Sending {} ({} bytes)", request, text.len());

        match self.exchange(text.as_bytes()).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::debug!("Retrying {} after transport error: {}", request, e);
                self.exchange(text.as_bytes()).await
            }
        }
    }
}

async fn exchange_on<S>(mut stream: S, request: &[u8], chunk_size: usize) -> Result<RawResponse, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(request).await?;
    stream.flush().await?;
    let response = read_response(&mut stream, chunk_size).await?;
    // The response is complete; a failed close must not discard it.
    let _ = stream.shutdown().await;
    Ok(response)
}

fn build_tls_connector() -> TlsConnector {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
