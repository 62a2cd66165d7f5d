//! # Peerdial client
//!
//! Outbound connection layer for a peer-to-peer synchronization engine.
//!
//! - **Proxy from environment**: `all_proxy` selects a SOCKS5 proxy
//!   (`socks`, `socks5`, `socks5h` schemes), `no_proxy` excludes hosts
//! - **Direct fallback**: a failed proxy dial is retried directly unless
//!   `ALL_PROXY_NO_FALLBACK` is set
//! - **Reuse-port dialing**: outbound connections can leave from a
//!   listener's local endpoint, as NAT traversal requires
//! - **Requested addressing**: connections report the address the caller
//!   asked for, not the proxy's
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use peerdial_client::{FallbackDialer, ProxyConfig};
//!
//! # async fn run() -> std::io::Result<()> {
//! let dialer = FallbackDialer::new(Arc::new(ProxyConfig::from_env()));
//! let conn = dialer.dial("tcp", "192.0.2.10:22000").await?;
//! assert_eq!(conn.remote_addr().to_string(), "192.0.2.10:22000");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod connect;
pub mod dialer;
pub mod error;
pub mod proxy;
pub mod registry;
pub mod transport;

pub use config::ProxyEnv;
pub use connect::{
    Connection, DialContext, Dialer, DialerAddr, DirectDialer, ReusePortDialer, set_tcp_options,
};
pub use dialer::FallbackDialer;
pub use error::{Error, Result};
pub use proxy::{PerHost, ProxyConfig, SchemeRegistry, Socks5Dialer};
pub use registry::{AddressRegistry, Registry, address_unspecified_less};
pub use transport::{HttpConnector, HttpTransport};

/// Cancellation token accepted by [`DialContext::with_cancellation`].
pub use tokio_util::sync::CancellationToken;
