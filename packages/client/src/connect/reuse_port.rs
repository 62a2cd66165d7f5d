//! Dialing from a listener's local endpoint
//!
//! Hole punching needs outbound connections to leave from the same
//! address and port a listener is bound to. The reuse options are applied
//! on every socket, bound or not.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpSocket, TcpStream};

use super::context::DialContext;
use super::direct::{connect_to_address_list, resolve_target};
use super::socket_config::reuse_port_control;
use super::{DialFuture, Dialer};
use crate::registry::{AddressRegistry, address_unspecified_less};

/// Direct dialer that binds to a registered local address.
#[derive(Clone, Debug)]
pub struct ReusePortDialer {
    registry: Arc<dyn AddressRegistry>,
    debug: bool,
}

impl ReusePortDialer {
    #[must_use]
    pub fn new(registry: Arc<dyn AddressRegistry>) -> Self {
        Self {
            registry,
            debug: false,
        }
    }

    /// Emit a debug event for every bound dial.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Dialer for ReusePortDialer {
    fn dial<'a>(&'a self, cx: &'a DialContext, network: &'a str, addr: &'a str) -> DialFuture<'a> {
        Box::pin(async move {
            let local = self.registry.get(network, address_unspecified_less);
            let targets = resolve_target(cx, network, addr).await?;

            let result = connect_to_address_list(cx, &targets, |target| {
                connect_reuse_port(target, local.and_then(|l| local_for_target(l, &target)))
            })
            .await;

            if self.debug
                && let Some(local) = local
            {
                match &result {
                    Ok(_) => tracing::debug!(
                        target: "peerdial::dialer",
                        "reuse-port dial {network} {addr} via {local}: ok"
                    ),
                    Err(e) => tracing::debug!(
                        target: "peerdial::dialer",
                        "reuse-port dial {network} {addr} via {local}: {e}"
                    ),
                }
            }
            result
        })
    }
}

/// Open a socket with reuse options, bind it to `local` if given, connect.
pub async fn connect_reuse_port(
    target: SocketAddr,
    local: Option<SocketAddr>,
) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(target), Type::STREAM, Some(Protocol::TCP))?;

    // Tokio requires O_NONBLOCK on adopted sockets.
    socket.set_nonblocking(true)?;
    reuse_port_control(&socket)?;

    if let Some(local) = local {
        socket.bind(&local.into())?;
    }

    let socket = TcpSocket::from_std_stream(socket.into());
    socket.connect(target).await
}

/// Adapt a registered local address to the destination's family.
///
/// Wildcards translate across families; a specific address of the other
/// family cannot be used and yields `None`.
fn local_for_target(local: SocketAddr, target: &SocketAddr) -> Option<SocketAddr> {
    match (local, target) {
        (SocketAddr::V4(_), SocketAddr::V4(_)) | (SocketAddr::V6(_), SocketAddr::V6(_)) => {
            Some(local)
        }
        (SocketAddr::V4(v4), SocketAddr::V6(_)) if v4.ip().is_unspecified() => {
            Some(SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), v4.port()))
        }
        (SocketAddr::V6(v6), SocketAddr::V4(_)) if v6.ip().is_unspecified() => {
            Some(SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), v6.port()))
        }
        _ => None,
    }
}
