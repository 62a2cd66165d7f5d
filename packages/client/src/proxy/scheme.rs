//! Proxy URL scheme table
//!
//! Maps a URL scheme to the constructor that builds its dialer. Standard
//! SOCKS5 schemes are present from the start; the short `socks` scheme is
//! registered once, before any URL is resolved against the global table.

use std::fmt;
use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;
use url::Url;

use super::socks::socks_dialer_from_url;
use crate::connect::Dialer;
use crate::error::{self, Result};

/// Builds a proxy dialer for `url` that reaches the proxy through `forward`.
pub type DialerConstructor = fn(&Url, Arc<dyn Dialer>) -> Result<Arc<dyn Dialer>>;

/// Explicit scheme → constructor lookup table.
#[derive(Clone, Default)]
pub struct SchemeRegistry {
    constructors: HashMap<String, DialerConstructor>,
}

impl SchemeRegistry {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the standard `socks5` and `socks5h` schemes.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .constructors
            .insert("socks5".to_string(), socks_dialer_from_url);
        registry
            .constructors
            .insert("socks5h".to_string(), socks_dialer_from_url);
        registry
    }

    /// Process-wide table: the standard schemes plus `socks`.
    pub fn global() -> &'static SchemeRegistry {
        static GLOBAL: OnceLock<SchemeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let mut registry = Self::standard();
            if let Err(e) = registry.register("socks", socks_dialer_from_url) {
                tracing::warn!(target: "peerdial::proxy", error = %e, "socks scheme not registered");
            }
            registry
        })
    }

    /// Add a constructor for `scheme`.
    ///
    /// # Errors
    ///
    /// Returns an error if `scheme` is not a valid lowercase URL scheme or
    /// is already registered.
    pub fn register(&mut self, scheme: &str, constructor: DialerConstructor) -> Result<()> {
        if !is_valid_scheme(scheme) {
            return Err(error::registration(scheme, "not a lowercase URL scheme"));
        }
        if self.constructors.contains_key(scheme) {
            return Err(error::registration(scheme, "already registered"));
        }
        self.constructors.insert(scheme.to_string(), constructor);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, scheme: &str) -> bool {
        self.constructors.contains_key(scheme)
    }

    /// Build the dialer registered for `url`'s scheme.
    ///
    /// # Errors
    ///
    /// Returns an error if no constructor is registered for the scheme, or
    /// if the constructor rejects the URL.
    pub fn from_url(&self, url: &Url, forward: Arc<dyn Dialer>) -> Result<Arc<dyn Dialer>> {
        let constructor = self
            .constructors
            .get(url.scheme())
            .ok_or_else(|| error::unsupported_scheme(url.scheme()))?;
        constructor(url, forward)
    }
}

impl fmt::Debug for SchemeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        f.debug_struct("SchemeRegistry")
            .field("schemes", &schemes)
            .finish()
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.')
        })
}
