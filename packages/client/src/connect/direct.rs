//! Direct (unproxied) TCP dialing
//!
//! Resolves the destination, filters candidates by network family and
//! tries them in order until one connects.

use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpStream;

use super::addr::{NetworkKind, split_host_port};
use super::context::DialContext;
use super::{DialFuture, Dialer};

/// Plain context-aware TCP dialer.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectDialer;

impl Dialer for DirectDialer {
    fn dial<'a>(&'a self, cx: &'a DialContext, network: &'a str, addr: &'a str) -> DialFuture<'a> {
        Box::pin(async move {
            let addrs = resolve_target(cx, network, addr).await?;
            connect_to_address_list(cx, &addrs, |target| TcpStream::connect(target)).await
        })
    }
}

/// Resolve `addr` to the candidate socket addresses for `network`.
///
/// IP literals take a fast path with no lookup.
pub async fn resolve_target(
    cx: &DialContext,
    network: &str,
    addr: &str,
) -> io::Result<Vec<SocketAddr>> {
    let kind = NetworkKind::parse(network)?;
    let (host, port) = split_host_port(addr)?;
    let port: u16 = port.parse().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("address {addr}: invalid port"),
        )
    })?;

    let candidates: Vec<SocketAddr> = if let Ok(ip) = host.parse::<IpAddr>() {
        vec![SocketAddr::new(ip, port)]
    } else {
        // An empty host dials the local system.
        let host = if host.is_empty() { "localhost" } else { host };
        cx.run(async {
            let resolved = tokio::net::lookup_host((host, port)).await?;
            Ok::<_, io::Error>(resolved.collect::<Vec<_>>())
        })
        .await?
    };

    let candidates: Vec<SocketAddr> = candidates
        .into_iter()
        .filter(|candidate| kind.accepts(candidate))
        .collect();

    if candidates.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no suitable {} address found for {addr}", kind.as_str()),
        ));
    }
    Ok(candidates)
}

/// Connect to the first reachable address.
///
/// Returns the first error when every candidate fails. A cancelled or
/// expired context stops the walk immediately.
pub async fn connect_to_address_list<F, Fut>(
    cx: &DialContext,
    addrs: &[SocketAddr],
    connect: F,
) -> io::Result<TcpStream>
where
    F: Fn(SocketAddr) -> Fut,
    Fut: Future<Output = io::Result<TcpStream>>,
{
    let mut first_err = None;

    for addr in addrs {
        match cx.run(connect(*addr)).await {
            Ok(stream) => return Ok(stream),
            Err(e) if cx.is_done() => return Err(e),
            Err(e) => {
                tracing::trace!(target: "peerdial::dialer", %addr, error = %e, "connect attempt failed");
                first_err.get_or_insert(e);
            }
        }
    }

    Err(first_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses to connect to")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ip_literal_fast_path() {
        let cx = DialContext::background();
        let addrs = resolve_target(&cx, "tcp", "127.0.0.1:22000").await.unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:22000".parse::<SocketAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_family_filter() {
        let cx = DialContext::background();
        let err = resolve_target(&cx, "tcp6", "127.0.0.1:22000")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrNotAvailable);
    }

    #[tokio::test]
    async fn test_invalid_port() {
        let cx = DialContext::background();
        let err = resolve_target(&cx, "tcp", "127.0.0.1:http-alt")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_direct_dial_loopback() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let stream = DirectDialer
            .dial(&DialContext::background(), "tcp", &addr)
            .await
            .unwrap();
        assert_eq!(stream.peer_addr().unwrap().to_string(), addr);
    }

    #[tokio::test]
    async fn test_os_timeout_moves_to_next_candidate() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let reachable = listener.local_addr().unwrap();
        let unreachable: SocketAddr = "[2001:db8::1]:22000".parse().unwrap();

        let stream = connect_to_address_list(
            &DialContext::background(),
            &[unreachable, reachable],
            |target| async move {
                if target == unreachable {
                    Err(io::Error::from(io::ErrorKind::TimedOut))
                } else {
                    TcpStream::connect(target).await
                }
            },
        )
        .await
        .unwrap();
        assert_eq!(stream.peer_addr().unwrap(), reachable);
    }

    #[tokio::test]
    async fn test_cancelled_context_stops_walk() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let reachable = listener.local_addr().unwrap();
        let first: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let cx = DialContext::background();
        let attempts = AtomicUsize::new(0);

        let err = connect_to_address_list(&cx, &[first, reachable], |target| {
            attempts.fetch_add(1, Ordering::SeqCst);
            let cx = &cx;
            async move {
                cx.cancel();
                Err::<TcpStream, _>(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    format!("{target}: refused"),
                ))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
