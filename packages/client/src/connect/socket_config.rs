//! TCP socket configuration utilities
//!
//! Post-connect hardening applied to every dialed stream, and the
//! pre-connect reuse options that let an outbound socket share a
//! listener's local endpoint.

use std::io;
use std::time::Duration;

use socket2::{SockRef, Socket, TcpKeepalive};
use tokio::net::TcpStream;

/// Idle time before the first keep-alive probe.
pub const KEEPALIVE_PERIOD: Duration = Duration::from_secs(60);

/// Configure a dialed TCP stream: no linger on close, Nagle enabled,
/// keep-alive probes after [`KEEPALIVE_PERIOD`] of idleness.
pub fn set_tcp_options(stream: &TcpStream) -> io::Result<()> {
    let sock = SockRef::from(stream);
    sock.set_linger(Some(Duration::ZERO))?;
    stream.set_nodelay(false)?;
    sock.set_tcp_keepalive(&TcpKeepalive::new().with_time(KEEPALIVE_PERIOD))?;
    Ok(())
}

/// Allow binding a local endpoint already held by a listener.
///
/// Sets `SO_REUSEADDR`, and `SO_REUSEPORT` where the platform has it.
pub fn reuse_port_control(socket: &Socket) -> io::Result<()> {
    socket.set_reuse_address(true)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port(true)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use socket2::{Domain, Protocol, Type};

    use super::*;

    #[test]
    fn test_reuse_port_control_sets_options() {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).unwrap();
        reuse_port_control(&socket).unwrap();
        assert!(socket.reuse_address().unwrap());
        #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
        assert!(socket.reuse_port().unwrap());
    }

    #[tokio::test]
    async fn test_set_tcp_options() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();
        set_tcp_options(&stream).unwrap();

        let sock = SockRef::from(&stream);
        assert!(sock.keepalive().unwrap());
        assert_eq!(sock.linger().unwrap(), Some(Duration::ZERO));
        assert!(!stream.nodelay().unwrap());
    }
}
