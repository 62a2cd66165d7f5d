//! Locally bound addresses available for outbound reuse
//!
//! Listeners register the addresses they are bound to; reuse-port dialing
//! looks one up so an outbound connection originates from the same local
//! endpoint. The dialer only reads from the registry.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

pub mod ordering;

pub use ordering::address_unspecified_less;

/// Strict "less than" predicate used to pick among candidates.
pub type AddrLess = fn(&SocketAddr, &SocketAddr) -> bool;

/// Read-only lookup of registered local addresses.
pub trait AddressRegistry: Send + Sync + std::fmt::Debug {
    /// The smallest address registered for `network` under `less`, if any.
    fn get(&self, network: &str, less: AddrLess) -> Option<SocketAddr>;
}

/// Concurrent in-process registry keyed by network kind.
#[derive(Debug, Default)]
pub struct Registry {
    available: DashMap<String, Vec<SocketAddr>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared process-wide registry.
    pub fn global() -> Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Registry::new())))
    }

    pub fn register(&self, network: &str, addr: SocketAddr) {
        self.available
            .entry(network.to_string())
            .or_default()
            .push(addr);
    }

    /// Remove one registration of `addr`; other duplicates stay.
    pub fn unregister(&self, network: &str, addr: SocketAddr) {
        let emptied = match self.available.get_mut(network) {
            Some(mut candidates) => {
                if let Some(pos) = candidates.iter().position(|c| *c == addr) {
                    candidates.swap_remove(pos);
                }
                candidates.is_empty()
            }
            None => false,
        };
        if emptied {
            self.available
                .remove_if(network, |_, candidates| candidates.is_empty());
        }
    }
}

impl AddressRegistry for Registry {
    fn get(&self, network: &str, less: AddrLess) -> Option<SocketAddr> {
        let candidates = self.available.get(network)?;
        candidates.iter().copied().reduce(|best, candidate| {
            if less(&candidate, &best) { candidate } else { best }
        })
    }
}
