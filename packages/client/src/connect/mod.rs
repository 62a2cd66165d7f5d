//! Dialer capability and direct TCP connection establishment
//!
//! Every dialer produces a raw `TcpStream`; proxies tunnel over TCP, so the
//! stream handed back by a SOCKS dialer is the one connected to the proxy.
//! Composition is by wrapping: a dialer holds the dialer it forwards to.

use std::fmt;
use std::io;

use futures::future::BoxFuture;
use tokio::net::TcpStream;

pub mod addr;
pub mod conn;
pub mod context;
pub mod direct;
pub mod reuse_port;
pub mod socket_config;

pub use addr::{DialerAddr, NetworkKind, split_host_port};
pub use conn::Connection;
pub use context::DialContext;
pub use direct::DirectDialer;
pub use reuse_port::ReusePortDialer;
pub use socket_config::{reuse_port_control, set_tcp_options};

/// Future returned by [`Dialer::dial`].
pub type DialFuture<'a> = BoxFuture<'a, io::Result<TcpStream>>;

/// Something that can open an outbound stream to `(network, addr)`.
///
/// Errors are transport errors and are returned unchanged to the caller.
pub trait Dialer: Send + Sync + fmt::Debug {
    fn dial<'a>(&'a self, cx: &'a DialContext, network: &'a str, addr: &'a str) -> DialFuture<'a>;
}
