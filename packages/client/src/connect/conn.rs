//! Connection adapter reporting the requested remote address

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

use super::addr::DialerAddr;
use super::socket_config;

pin_project! {
    /// An established outbound stream.
    ///
    /// [`remote_addr`](Connection::remote_addr) reports the `(network, addr)`
    /// the caller dialed, not the peer of the underlying socket, which may be
    /// a proxy.
    #[derive(Debug)]
    pub struct Connection {
        #[pin]
        stream: TcpStream,
        remote: DialerAddr,
    }
}

impl Connection {
    #[must_use]
    pub fn new(stream: TcpStream, remote: DialerAddr) -> Self {
        Self { stream, remote }
    }

    /// Wrap `stream`, recording `(network, addr)` as its remote address.
    #[must_use]
    pub fn requested(stream: TcpStream, network: &str, addr: &str) -> Self {
        Self::new(stream, DialerAddr::new(network, addr))
    }

    #[must_use]
    pub fn remote_addr(&self) -> &DialerAddr {
        &self.remote
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    /// Peer of the underlying socket; the proxy when one was used.
    pub fn transport_peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Apply the default TCP options to the underlying socket.
    pub fn set_tcp_options(&self) -> io::Result<()> {
        socket_config::set_tcp_options(&self.stream)
    }

    #[must_use]
    pub fn get_ref(&self) -> &TcpStream {
        &self.stream
    }

    #[must_use]
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.project().stream.poll_read(cx, buf)
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.project().stream.poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().stream.poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().stream.poll_shutdown(cx)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        self.project().stream.poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.stream.is_write_vectored()
    }
}
