//! Network kinds and the caller-visible remote address

use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Stream network kinds accepted by the dialers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Tcp,
    Tcp4,
    Tcp6,
}

impl NetworkKind {
    /// Parse `tcp`, `tcp4` or `tcp6`; anything else is `InvalidInput`.
    pub fn parse(network: &str) -> io::Result<Self> {
        match network {
            "tcp" => Ok(NetworkKind::Tcp),
            "tcp4" => Ok(NetworkKind::Tcp4),
            "tcp6" => Ok(NetworkKind::Tcp6),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported network {other:?}"),
            )),
        }
    }

    /// Whether `addr` belongs to this network's address family.
    #[must_use]
    pub fn accepts(self, addr: &SocketAddr) -> bool {
        match self {
            NetworkKind::Tcp => true,
            NetworkKind::Tcp4 => addr.is_ipv4(),
            NetworkKind::Tcp6 => addr.is_ipv6(),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkKind::Tcp => "tcp",
            NetworkKind::Tcp4 => "tcp4",
            NetworkKind::Tcp6 => "tcp6",
        }
    }
}

/// Split `host:port` or `[v6]:port` into its host and port strings.
///
/// Brackets are stripped from IPv6 hosts. A bare IPv6 address without
/// brackets is rejected as ambiguous.
pub fn split_host_port(addr: &str) -> io::Result<(&str, &str)> {
    let invalid = |reason: &str| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("address {addr}: {reason}"),
        )
    };

    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| invalid("missing ']'"))?;
        let port = tail.strip_prefix(':').ok_or_else(|| invalid("missing port"))?;
        (host, port)
    } else {
        let (host, port) = addr.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
        if host.contains(':') {
            return Err(invalid("too many colons"));
        }
        (host, port)
    };

    if port.is_empty() {
        return Err(invalid("missing port"));
    }
    Ok((host, port))
}

/// The remote address reported by a dialed [`Connection`](super::Connection).
///
/// Always echoes what the caller asked for: a structured socket address
/// when the request was an `ip:port` literal, otherwise the raw request
/// string verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialerAddr {
    Resolved { network: String, addr: SocketAddr },
    Literal { network: String, addr: String },
}

impl DialerAddr {
    /// Never fails.
    #[must_use]
    pub fn new(network: &str, addr: &str) -> Self {
        match addr.parse::<SocketAddr>() {
            Ok(resolved) => DialerAddr::Resolved {
                network: network.to_string(),
                addr: resolved,
            },
            Err(_) => DialerAddr::Literal {
                network: network.to_string(),
                addr: addr.to_string(),
            },
        }
    }

    #[must_use]
    pub fn network(&self) -> &str {
        match self {
            DialerAddr::Resolved { network, .. } | DialerAddr::Literal { network, .. } => network,
        }
    }

    #[must_use]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            DialerAddr::Resolved { addr, .. } => Some(*addr),
            DialerAddr::Literal { .. } => None,
        }
    }
}

impl fmt::Display for DialerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialerAddr::Resolved { addr, .. } => write!(f, "{addr}"),
            DialerAddr::Literal { addr, .. } => f.write_str(addr),
        }
    }
}
