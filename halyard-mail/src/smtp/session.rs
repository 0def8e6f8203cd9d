//! A single SMTP session against the relay.

use std::sync::Arc;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore, pki_types::ServerName},
};
use tracing::{trace, warn};

use crate::settings::TransporterOptions;

use super::{
    error::{Result, TransportError},
    response::Response,
};

/// Initial size of the response read buffer.
const BUFFER_SIZE: usize = 8192;

/// Cap on response buffer growth (1MB).
const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// The underlying connection, plain TCP or TLS-wrapped.
enum Connection {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl Connection {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(stream) => stream.write_all(data).await?,
            Self::Tls(stream) => stream.write_all(data).await?,
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = match self {
            Self::Plain(stream) => stream.read(buf).await?,
            Self::Tls(stream) => stream.read(buf).await?,
        };
        if n == 0 {
            return Err(TransportError::ConnectionClosed);
        }
        Ok(n)
    }
}

/// Wrap a fresh TCP stream in TLS using the system trust roots.
async fn wrap_tls(
    stream: TcpStream,
    host: &str,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let mut root_store = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for cert in certs.certs {
        root_store
            .add(cert)
            .map_err(|e| TransportError::Tls(format!("failed to add certificate: {e}")))?;
    }
    if !certs.errors.is_empty() {
        warn!(errors = ?certs.errors, "some system certificates could not be loaded");
    }

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| TransportError::Tls(format!("invalid server name '{host}': {e}")))?;

    connector
        .connect(server_name, stream)
        .await
        .map_err(|e| TransportError::Tls(e.to_string()))
}

/// An open SMTP session.
///
/// `open` consumes the server greeting, so a freshly-opened session is
/// ready for EHLO.
pub(crate) struct Session {
    connection: Connection,
    buffer: Vec<u8>,
    filled: usize,
}

impl Session {
    /// Connect to the relay and consume the greeting.
    pub(crate) async fn open(options: &TransporterOptions) -> Result<Self> {
        let stream = TcpStream::connect((options.host.as_str(), options.port)).await?;

        let connection = if options.secure {
            Connection::Tls(Box::new(wrap_tls(stream, &options.host).await?))
        } else {
            Connection::Plain(stream)
        };

        let mut session = Self {
            connection,
            buffer: vec![0u8; BUFFER_SIZE],
            filled: 0,
        };

        let greeting = session.read_response().await?;
        Self::check(greeting)?;

        Ok(session)
    }

    pub(crate) async fn ehlo(&mut self, hello_name: &str) -> Result<Response> {
        self.command(&format!("EHLO {hello_name}")).await
    }

    pub(crate) async fn mail_from(&mut self, from: &str) -> Result<Response> {
        self.command(&format!("MAIL FROM:<{from}>")).await
    }

    pub(crate) async fn rcpt_to(&mut self, to: &str) -> Result<Response> {
        self.command(&format!("RCPT TO:<{to}>")).await
    }

    pub(crate) async fn data(&mut self) -> Result<Response> {
        self.command("DATA").await
    }

    /// Send the message payload and the end-of-data marker.
    ///
    /// The payload must already be dot-stuffed.
    pub(crate) async fn payload(&mut self, data: &str) -> Result<Response> {
        self.connection.write_all(data.as_bytes()).await?;
        if !data.ends_with("\r\n") {
            self.connection.write_all(b"\r\n").await?;
        }
        self.connection.write_all(b".\r\n").await?;

        let response = self.read_response().await?;
        Self::check(response)
    }

    pub(crate) async fn quit(&mut self) -> Result<Response> {
        self.command("QUIT").await
    }

    /// Send a command line and validate the response.
    async fn command(&mut self, command: &str) -> Result<Response> {
        trace!(command, "smtp >>");
        self.connection
            .write_all(format!("{command}\r\n").as_bytes())
            .await?;
        let response = self.read_response().await?;
        Self::check(response)
    }

    /// Accept 2xx/3xx responses; turn 4xx/5xx into [`TransportError::Smtp`]
    /// and anything else into [`TransportError::UnexpectedResponse`].
    fn check(response: Response) -> Result<Response> {
        trace!(code = response.code, "smtp <<");
        if response.is_success() || response.is_intermediate() {
            Ok(response)
        } else if response.is_error() {
            Err(TransportError::Smtp {
                code: response.code,
                message: response.message(),
            })
        } else {
            Err(TransportError::UnexpectedResponse {
                code: response.code,
                message: response.message(),
            })
        }
    }

    /// Read one complete SMTP response from the connection.
    async fn read_response(&mut self) -> Result<Response> {
        loop {
            if let Some((response, consumed)) = Response::parse(&self.buffer[..self.filled])? {
                self.buffer.copy_within(consumed..self.filled, 0);
                self.filled -= consumed;
                return Ok(response);
            }

            if self.filled >= self.buffer.len() {
                let new_size = self.buffer.len() * 2;
                if new_size > MAX_BUFFER_SIZE {
                    return Err(TransportError::Parse(format!(
                        "response exceeds {MAX_BUFFER_SIZE} bytes"
                    )));
                }
                self.buffer.resize(new_size, 0);
            }

            let n = self.connection.read(&mut self.buffer[self.filled..]).await?;
            self.filled += n;
        }
    }
}
