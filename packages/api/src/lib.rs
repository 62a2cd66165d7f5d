//! Peerdial public API
//!
//! Process-wide outbound dialing for the synchronization engine. The proxy
//! configuration is read from the environment once, on first use, and is
//! immutable afterwards; every function here may be called concurrently.
//!
//! ```no_run
//! # async fn run() -> std::io::Result<()> {
//! let conn = peerdial::dial("tcp", "192.0.2.10:22000").await?;
//! println!("connected to {}", conn.remote_addr());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

use std::io;
use std::sync::{Arc, OnceLock};

use tracing_subscriber::EnvFilter;

// Re-export important types from client package
pub use peerdial_client::{
    AddressRegistry, CancellationToken, Connection, DialContext, Dialer, DialerAddr, DirectDialer,
    FallbackDialer, HttpConnector, HttpTransport, ProxyConfig, ProxyEnv, Registry,
    ReusePortDialer, address_unspecified_less, set_tcp_options,
};

/// Environment read once, shared by both dialers.
static ENV: OnceLock<ProxyEnv> = OnceLock::new();
static DIALER: OnceLock<FallbackDialer> = OnceLock::new();
static REUSE_PORT_DIALER: OnceLock<FallbackDialer> = OnceLock::new();
static HTTP_TRANSPORT: OnceLock<Option<HttpTransport>> = OnceLock::new();

fn env() -> &'static ProxyEnv {
    ENV.get_or_init(ProxyEnv::from_env)
}

/// Resolve the proxy configuration now rather than on the first dial.
///
/// Schedules the one-time startup notice. Idempotent.
pub fn init() {
    dialer();
}

/// The process-wide dialer over a plain direct connection.
pub fn dialer() -> &'static FallbackDialer {
    DIALER.get_or_init(|| {
        let config = ProxyConfig::resolve(env(), Arc::new(DirectDialer));
        config.announce();
        FallbackDialer::new(Arc::new(config))
    })
}

/// The process-wide dialer whose direct leg binds to a registered local
/// address from [`Registry::global`].
pub fn reuse_port_dialer() -> &'static FallbackDialer {
    REUSE_PORT_DIALER.get_or_init(|| {
        let env = env();
        let forward = ReusePortDialer::new(Registry::global()).with_debug(env.dialer_debug());
        FallbackDialer::new(Arc::new(ProxyConfig::resolve(env, Arc::new(forward))))
    })
}

/// Default outbound HTTP transport; `None` unless a proxy is configured.
pub fn http_transport() -> Option<&'static HttpTransport> {
    HTTP_TRANSPORT
        .get_or_init(|| HttpTransport::from_dialer(dialer().clone()))
        .as_ref()
}

/// Whether the environment configured a usable proxy.
pub fn using_proxy() -> bool {
    dialer().config().using_proxy()
}

/// Dial `addr` on `network`, through the proxy when one is configured.
///
/// # Errors
///
/// Returns the transport error of the last attempt made.
pub async fn dial(network: &str, addr: &str) -> io::Result<Connection> {
    dialer().dial(network, addr).await
}

/// Like [`dial`], bounded by `cx`.
///
/// # Errors
///
/// Returns the transport error of the last attempt made, or an
/// `Interrupted`/`TimedOut` error when `cx` aborts the dial.
pub async fn dial_context(cx: &DialContext, network: &str, addr: &str) -> io::Result<Connection> {
    dialer().dial_context(cx, network, addr).await
}

/// Like [`dial_context`], but the direct leg originates from a registered
/// listener address so the connection can take part in hole punching.
///
/// # Errors
///
/// Returns the transport error of the last attempt made, or an
/// `Interrupted`/`TimedOut` error when `cx` aborts the dial.
pub async fn dial_context_reuse_port(
    cx: &DialContext,
    network: &str,
    addr: &str,
) -> io::Result<Connection> {
    reuse_port_dialer().dial_context(cx, network, addr).await
}

/// Install a `tracing` subscriber honouring `STTRACE`.
///
/// Info level by default; debug for the dialer when its facility (or
/// `all`) is listed. `RUST_LOG` directives, when set, take precedence.
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = if env().dialer_debug() {
            "info,peerdial::dialer=debug,peerdial::proxy=debug"
        } else {
            "info"
        };
        EnvFilter::new(directives)
    });

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
    {
        tracing::debug!(target: "peerdial::dialer", trace = %env().trace, "tracing subscriber installed");
    }
}
