//! Proxy-first dialing with direct fallback

use std::io;
use std::sync::Arc;

use tokio::net::TcpStream;

use crate::connect::{Connection, DialContext};
use crate::proxy::ProxyConfig;

/// Public dial entry point.
///
/// Tries the resolved proxy chain; if that fails and a proxy is in use
/// with fallback allowed, tries the direct dialer once. Successful streams
/// get the default TCP options and report the requested remote address.
/// Holds no per-call state, so one instance serves any number of
/// concurrent dials.
#[derive(Clone, Debug)]
pub struct FallbackDialer {
    config: Arc<ProxyConfig>,
}

impl FallbackDialer {
    #[must_use]
    pub fn new(config: Arc<ProxyConfig>) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Dial with no deadline and no cancellation.
    pub async fn dial(&self, network: &str, addr: &str) -> io::Result<Connection> {
        self.dial_context(&DialContext::background(), network, addr)
            .await
    }

    /// Dial under `cx`; cancellation and deadline apply to both attempts.
    pub async fn dial_context(
        &self,
        cx: &DialContext,
        network: &str,
        addr: &str,
    ) -> io::Result<Connection> {
        let config = &*self.config;
        let via = if config.using_proxy() { "proxy" } else { "direct" };

        let err = match config.dialer().dial(cx, network, addr).await {
            Ok(stream) => {
                if config.debug() {
                    trace_success(network, addr, via, &stream);
                }
                return Ok(finish(stream, network, addr));
            }
            Err(e) => e,
        };
        if config.debug() {
            tracing::debug!(
                target: "peerdial::dialer",
                "Dialing {network} address {addr} via {via} - error {err}"
            );
        }

        if !config.using_proxy() || config.no_fallback() {
            return Err(err);
        }

        match config.direct_dialer().dial(cx, network, addr).await {
            Ok(stream) => {
                if config.debug() {
                    trace_success(network, addr, "fallback", &stream);
                }
                Ok(finish(stream, network, addr))
            }
            Err(e) => {
                if config.debug() {
                    tracing::debug!(
                        target: "peerdial::dialer",
                        "Dialing {network} address {addr} via fallback - error {e}"
                    );
                }
                Err(e)
            }
        }
    }
}

/// Harden the socket and wrap it with the requested address.
fn finish(stream: TcpStream, network: &str, addr: &str) -> Connection {
    let conn = Connection::requested(stream, network, addr);
    if let Err(e) = conn.set_tcp_options() {
        tracing::debug!(target: "peerdial::dialer", error = %e, "failed to set TCP options");
    }
    conn
}

fn trace_success(network: &str, addr: &str, via: &str, stream: &TcpStream) {
    let show = |r: io::Result<std::net::SocketAddr>| {
        r.map_or_else(|_| "?".to_string(), |a| a.to_string())
    };
    let local = show(stream.local_addr());
    let remote = show(stream.peer_addr());
    tracing::debug!(
        target: "peerdial::dialer",
        "Dialing {network} address {addr} via {via} - success, {local} -> {remote}"
    );
}
