//! Proxy chain construction
//!
//! The chain is resolved once from a [`ProxyEnv`](crate::config::ProxyEnv):
//! a direct (or reuse-port) dialer, optionally wrapped by a SOCKS5 dialer
//! chosen by URL scheme, optionally wrapped by per-host exclusions.

pub mod per_host;
pub mod resolver;
pub mod scheme;
pub mod socks;

pub use per_host::PerHost;
pub use resolver::ProxyConfig;
pub use scheme::{DialerConstructor, SchemeRegistry};
pub use socks::{Auth, Socks5Dialer, SocksError, socks_dialer_from_url};
