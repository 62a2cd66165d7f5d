//! HTTP client wiring through the dialer
//!
//! When a proxy is active, outbound HTTP traffic is dialed through the
//! same fallback chain as peer connections.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use http::Uri;
use hyper_util::client::legacy::connect::{Connected, Connection as HyperConnection};
use hyper_util::rt::TokioIo;
use tower_service::Service;

use crate::connect::Connection;
use crate::dialer::FallbackDialer;

/// Deadline for a TLS handshake layered over an [`HttpConnector`] stream.
pub const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// `hyper_util` legacy-client connector dialing through a [`FallbackDialer`].
#[derive(Clone, Debug)]
pub struct HttpConnector {
    dialer: FallbackDialer,
}

impl HttpConnector {
    #[must_use]
    pub fn new(dialer: FallbackDialer) -> Self {
        Self { dialer }
    }
}

impl Service<Uri> for HttpConnector {
    type Response = TokioIo<Connection>;
    type Error = io::Error;
    type Future = Pin<Box<dyn Future<Output = io::Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let dialer = self.dialer.clone();
        Box::pin(async move {
            let addr = authority_addr(&dst)?;
            let conn = dialer.dial("tcp", &addr).await?;
            Ok(TokioIo::new(conn))
        })
    }
}

impl HyperConnection for Connection {
    fn connected(&self) -> Connected {
        Connected::new()
    }
}

/// `host:port` for `uri`, defaulting the port from the scheme.
fn authority_addr(uri: &Uri) -> io::Result<String> {
    let host = uri
        .host()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("{uri}: missing host")))?;
    let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
        Some("https") => 443,
        _ => 80,
    });
    Ok(format!("{host}:{port}"))
}

/// Default outbound HTTP transport, installed only when a proxy is active.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    connector: HttpConnector,
    tls_handshake_timeout: Duration,
}

impl HttpTransport {
    /// `None` when `dialer` does not route through a proxy.
    #[must_use]
    pub fn from_dialer(dialer: FallbackDialer) -> Option<Self> {
        dialer.config().using_proxy().then(|| Self {
            connector: HttpConnector::new(dialer),
            tls_handshake_timeout: TLS_HANDSHAKE_TIMEOUT,
        })
    }

    #[must_use]
    pub fn connector(&self) -> HttpConnector {
        self.connector.clone()
    }

    #[must_use]
    pub fn with_tls_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.tls_handshake_timeout = timeout;
        self
    }

    #[must_use]
    pub fn tls_handshake_timeout(&self) -> Duration {
        self.tls_handshake_timeout
    }

    /// Drive a TLS handshake over a connector stream, failing with
    /// `ErrorKind::TimedOut` once the handshake deadline passes.
    ///
    /// # Errors
    ///
    /// The handshake's own error, or `TimedOut`.
    pub async fn tls_handshake<F, T>(&self, handshake: F) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        tokio::time::timeout(self.tls_handshake_timeout, handshake)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "TLS handshake timeout"))?
    }
}
