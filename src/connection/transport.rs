//! TCP/TLS transport and line framing.
//!
//! Provides a unified stream type for plaintext and TLS connections and a
//! framed transport on top of it. Inbound frames are raw lines so that one
//! malformed message is dropped on its own instead of ending the stream;
//! outbound messages go through [`IrcCodec`], which cuts anything after an
//! embedded line break.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::{SinkExt, StreamExt};
use irc_proto::line::LineCodec;
use irc_proto::{IrcCodec, Message};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{self, CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::config::ServerBlock;
use crate::error::ConnectError;

const ENCODING: &str = "utf-8";

/// A unified stream type for server connections.
pub enum IrcStream {
    /// Plaintext TCP connection.
    Plain(TcpStream),
    /// TLS-encrypted client connection.
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for IrcStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            IrcStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for IrcStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            IrcStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            IrcStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            IrcStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            IrcStream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Line transport: raw lines in, [`Message`]s out.
pub struct Transport {
    reader: FramedRead<ReadHalf<IrcStream>, LineCodec>,
    writer: FramedWrite<WriteHalf<IrcStream>, IrcCodec>,
}

impl Transport {
    pub fn new(stream: IrcStream) -> Result<Self, ConnectError> {
        let line_codec = LineCodec::new(ENCODING).map_err(io::Error::other)?;
        let irc_codec = IrcCodec::new(ENCODING).map_err(io::Error::other)?;
        let (read, write) = tokio::io::split(stream);
        Ok(Self {
            reader: FramedRead::new(read, line_codec),
            writer: FramedWrite::new(write, irc_codec),
        })
    }

    /// Write one message.
    pub async fn send(&mut self, message: Message) -> io::Result<()> {
        debug!(line = %message.to_string().trim_end(), "->");
        self.writer.send(message).await.map_err(io::Error::other)
    }

    /// Read the next line with its terminator removed. Undecodable bytes are
    /// replaced rather than rejected.
    ///
    /// Returns `None` once the peer has closed the connection.
    pub async fn next_line(&mut self) -> Option<io::Result<String>> {
        let frame = self.reader.next().await?;
        Some(
            frame
                .map(|line| line.trim_end_matches(['\r', '\n']).to_string())
                .map_err(io::Error::other),
        )
    }

    /// Flush pending output and shut down the write half.
    pub async fn close(&mut self) {
        if let Err(e) = self.writer.close().await {
            debug!(error = %e, "Error closing transport");
        }
    }
}

/// Open a TCP connection to the block's address, upgrading to TLS if configured.
pub async fn connect(block: &ServerBlock) -> Result<Transport, ConnectError> {
    if block.host.is_empty() || block.port == 0 {
        return Err(ConnectError::InvalidAddress(block.address()));
    }
    let tcp = TcpStream::connect((block.host.as_str(), block.port)).await?;
    if let Err(e) = tcp.set_nodelay(true) {
        debug!(error = %e, "Failed to set TCP_NODELAY");
    }

    let stream = if block.tls {
        let tls = upgrade_to_tls(tcp, &block.host, block.verify_cert).await?;
        IrcStream::Tls(Box::new(tls))
    } else {
        IrcStream::Plain(tcp)
    };
    info!(address = %block.address(), tls = block.tls, "Connected");
    Transport::new(stream)
}

/// Upgrades a TCP stream to TLS.
///
/// `hostname` is used for SNI and certificate verification. With
/// `verify_cert` off any certificate is accepted.
async fn upgrade_to_tls(
    tcp_stream: TcpStream,
    hostname: &str,
    verify_cert: bool,
) -> Result<TlsStream<TcpStream>, ConnectError> {
    let provider = Arc::new(crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| ConnectError::Tls(e.to_string()))?;

    let config = if verify_cert {
        let mut roots = RootCertStore::empty();
        let certs = rustls_native_certs::load_native_certs();
        for cert in certs.certs {
            if let Err(e) = roots.add(cert) {
                warn!(error = %e, "Failed to add root cert");
            }
        }
        for e in &certs.errors {
            warn!(error = %e, "Error loading native certs");
        }
        builder.with_root_certificates(roots).with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousNoVerifier(provider)))
            .with_no_client_auth()
    };

    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| ConnectError::InvalidAddress(hostname.to_string()))?;

    let tls_stream = connector.connect(server_name, tcp_stream).await?;
    info!(hostname = %hostname, verify = verify_cert, "TLS handshake completed");
    Ok(tls_stream)
}

/// Certificate verifier that accepts any server certificate.
///
/// Signatures are still checked so the handshake itself stays sound; only
/// the chain of trust is skipped. For self-signed test networks.
#[derive(Debug)]
struct DangerousNoVerifier(Arc<CryptoProvider>);

impl ServerCertVerifier for DangerousNoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        crypto::verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        crypto::verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
