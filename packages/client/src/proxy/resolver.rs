//! Proxy chain resolution from the environment

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use super::per_host::PerHost;
use super::scheme::SchemeRegistry;
use crate::config::ProxyEnv;
use crate::connect::{Dialer, DirectDialer};
use crate::error::{self, Result};

/// Delay before the one-time startup notices, so logging is set up first.
pub const ANNOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Immutable outcome of proxy resolution.
///
/// `dialer` is the full chain; `direct` is the innermost dialer the chain
/// was built around and the one used for fallback.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    dialer: Arc<dyn Dialer>,
    direct: Arc<dyn Dialer>,
    using_proxy: bool,
    no_fallback: bool,
    debug: bool,
}

impl ProxyConfig {
    /// Resolve from the process environment around a [`DirectDialer`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::resolve(&ProxyEnv::from_env(), Arc::new(DirectDialer))
    }

    /// A configuration that never proxies.
    #[must_use]
    pub fn direct(forward: Arc<dyn Dialer>) -> Self {
        Self {
            dialer: Arc::clone(&forward),
            direct: forward,
            using_proxy: false,
            no_fallback: false,
            debug: false,
        }
    }

    /// Resolve `env` around `forward` using the global scheme table.
    #[must_use]
    pub fn resolve(env: &ProxyEnv, forward: Arc<dyn Dialer>) -> Self {
        Self::resolve_with(env, forward, SchemeRegistry::global())
    }

    /// Resolve `env` around `forward` using `schemes`.
    ///
    /// Configuration problems never fail: an unusable proxy URL leaves the
    /// direct dialer in place.
    #[must_use]
    pub fn resolve_with(env: &ProxyEnv, forward: Arc<dyn Dialer>, schemes: &SchemeRegistry) -> Self {
        let chain = match build_chain(env, &forward, schemes) {
            Ok(chain) => chain,
            Err(e) => {
                tracing::debug!(target: "peerdial::proxy", error = %e, "proxy disabled");
                None
            }
        };

        let using_proxy = chain.is_some();
        Self {
            dialer: chain.unwrap_or_else(|| Arc::clone(&forward)),
            direct: forward,
            using_proxy,
            no_fallback: env.no_fallback,
            debug: env.dialer_debug(),
        }
    }

    /// The resolved chain.
    #[must_use]
    pub fn dialer(&self) -> &Arc<dyn Dialer> {
        &self.dialer
    }

    /// The innermost dialer, used for fallback.
    #[must_use]
    pub fn direct_dialer(&self) -> &Arc<dyn Dialer> {
        &self.direct
    }

    #[must_use]
    pub fn using_proxy(&self) -> bool {
        self.using_proxy
    }

    #[must_use]
    pub fn no_fallback(&self) -> bool {
        self.no_fallback
    }

    /// Whether dial decisions are traced at debug level.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Log the proxy state once, [`ANNOUNCE_DELAY`] from now, on a detached
    /// thread.
    pub fn announce(&self) {
        let (using_proxy, no_fallback, debug) = (self.using_proxy, self.no_fallback, self.debug);

        let spawned = std::thread::Builder::new()
            .name("peerdial-announce".to_string())
            .spawn(move || {
                std::thread::sleep(ANNOUNCE_DELAY);
                if using_proxy {
                    tracing::info!(target: "peerdial::proxy", "Proxy settings detected");
                    if no_fallback {
                        tracing::info!(target: "peerdial::proxy", "Proxy fallback disabled");
                    }
                } else if debug {
                    tracing::debug!(
                        target: "peerdial::dialer",
                        "Dialer logging disabled, as no proxy was detected"
                    );
                }
            });

        if let Err(e) = spawned {
            tracing::debug!(target: "peerdial::proxy", error = %e, "announce thread not started");
        }
    }
}

/// `Ok(None)` when no proxy is configured.
fn build_chain(
    env: &ProxyEnv,
    forward: &Arc<dyn Dialer>,
    schemes: &SchemeRegistry,
) -> Result<Option<Arc<dyn Dialer>>> {
    let Some(raw) = env.all_proxy.as_deref() else {
        return Ok(None);
    };

    let url = Url::parse(raw).map_err(|e| error::invalid_url(raw, e))?;
    let proxy = schemes.from_url(&url, Arc::clone(forward))?;

    let Some(no_proxy) = env.no_proxy.as_deref() else {
        return Ok(Some(proxy));
    };

    let mut per_host = PerHost::new(proxy, Arc::clone(forward));
    per_host.add_from_string(no_proxy);
    Ok(Some(Arc::new(per_host)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(env: ProxyEnv) -> ProxyConfig {
        ProxyConfig::resolve(&env, Arc::new(DirectDialer))
    }

    #[test]
    fn test_no_proxy_configured() {
        let config = resolve(ProxyEnv::default());
        assert!(!config.using_proxy());
        assert!(Arc::ptr_eq(config.dialer(), config.direct_dialer()));
    }

    #[test]
    fn test_unparsable_url_degrades() {
        let config = resolve(ProxyEnv::default().with_all_proxy("::not a url::"));
        assert!(!config.using_proxy());
        assert!(Arc::ptr_eq(config.dialer(), config.direct_dialer()));
    }

    #[test]
    fn test_unsupported_scheme_degrades() {
        let config = resolve(ProxyEnv::default().with_all_proxy("http://proxy.local:3128"));
        assert!(!config.using_proxy());
    }

    #[test]
    fn test_missing_host_degrades() {
        let config = resolve(ProxyEnv::default().with_all_proxy("socks5:///path"));
        assert!(!config.using_proxy());
    }

    #[test]
    fn test_socks_proxy_chain() {
        let config = resolve(
            ProxyEnv::default()
                .with_all_proxy("socks://127.0.0.1:1080")
                .with_no_fallback(true),
        );
        assert!(config.using_proxy());
        assert!(config.no_fallback());
        assert!(format!("{:?}", config.dialer()).contains("Socks5Dialer"));
    }

    #[test]
    fn test_exclusions_wrap_proxy() {
        let config = resolve(
            ProxyEnv::default()
                .with_all_proxy("socks5://127.0.0.1:1080")
                .with_no_proxy("10.0.0.0/8"),
        );
        assert!(config.using_proxy());
        let rendered = format!("{:?}", config.dialer());
        assert!(rendered.starts_with("PerHost"));
        assert!(rendered.contains("Socks5Dialer"));
    }

    #[test]
    fn test_custom_scheme_table() {
        let schemes = SchemeRegistry::new();
        let env = ProxyEnv::default().with_all_proxy("socks5://127.0.0.1:1080");
        let config = ProxyConfig::resolve_with(&env, Arc::new(DirectDialer), &schemes);
        assert!(!config.using_proxy());
    }

    #[test]
    fn test_debug_flag_from_trace() {
        assert!(resolve(ProxyEnv::default().with_trace("dialer")).debug());
        assert!(!resolve(ProxyEnv::default().with_trace("model")).debug());
    }
}
