//! Reuse-port dialing from a registered listener endpoint

mod common;

use std::sync::Arc;

use common::{EchoServer, assert_echo};
use peerdial_client::{FallbackDialer, ProxyConfig, Registry, ReusePortDialer};

fn reuse_port_dialer(registry: Arc<Registry>) -> FallbackDialer {
    let forward = ReusePortDialer::new(registry).with_debug(true);
    FallbackDialer::new(Arc::new(ProxyConfig::direct(Arc::new(forward))))
}

#[tokio::test]
async fn test_empty_registry_dials_ephemeral() {
    let echo = EchoServer::start().await;

    let mut conn = reuse_port_dialer(Arc::new(Registry::new()))
        .dial("tcp", &echo.addr.to_string())
        .await
        .expect("dial without registered address");

    assert_ne!(conn.local_addr().unwrap().port(), 0);
    assert_echo(&mut conn).await;
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_dial_shares_listener_port() {
    use socket2::{Domain, Protocol, Socket, Type};

    use peerdial_client::connect::reuse_port_control;

    let listener = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).unwrap();
    reuse_port_control(&listener).unwrap();
    listener
        .bind(&"127.0.0.1:0".parse::<std::net::SocketAddr>().unwrap().into())
        .unwrap();
    listener.listen(16).unwrap();
    let local = listener.local_addr().unwrap().as_socket().unwrap();

    let registry = Arc::new(Registry::new());
    registry.register("tcp", local);
    let echo = EchoServer::start().await;

    let mut conn = reuse_port_dialer(Arc::clone(&registry))
        .dial("tcp", &echo.addr.to_string())
        .await
        .expect("dial from listener port");

    assert_eq!(conn.local_addr().unwrap(), local);
    assert_eq!(conn.remote_addr().to_string(), echo.addr.to_string());
    assert_echo(&mut conn).await;

    registry.unregister("tcp", local);
    let conn = reuse_port_dialer(registry)
        .dial("tcp", &echo.addr.to_string())
        .await
        .expect("dial after unregister");
    assert_ne!(conn.local_addr().unwrap(), local);
}

#[tokio::test]
async fn test_registry_for_other_network_ignored() {
    let echo = EchoServer::start().await;
    let registry = Arc::new(Registry::new());
    registry.register("tcp6", "[::1]:1".parse().unwrap());

    let mut conn = reuse_port_dialer(registry)
        .dial("tcp", &echo.addr.to_string())
        .await
        .expect("tcp dial ignores tcp6 entries");
    assert_echo(&mut conn).await;
}
