//! Local address preference

use std::net::SocketAddr;

/// Orders wildcard (unspecified) addresses before specific ones.
///
/// Two addresses of the same kind are equal under this ordering, so the
/// registry keeps whichever it saw first.
#[must_use]
pub fn address_unspecified_less(a: &SocketAddr, b: &SocketAddr) -> bool {
    a.ip().is_unspecified() && !b.ip().is_unspecified()
}
