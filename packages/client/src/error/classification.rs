use super::types::{Error, Kind};

impl Error {
    /// Returns true if the proxy URL itself could not be parsed.
    #[must_use]
    pub fn is_invalid_url(&self) -> bool {
        matches!(self.inner.kind, Kind::InvalidUrl)
    }

    /// Returns true if the URL scheme has no registered constructor.
    #[must_use]
    pub fn is_unsupported_scheme(&self) -> bool {
        matches!(self.inner.kind, Kind::UnsupportedScheme)
    }

    /// Returns true if the proxy host or port was rejected.
    #[must_use]
    pub fn is_invalid_proxy_address(&self) -> bool {
        matches!(self.inner.kind, Kind::InvalidProxyAddress)
    }

    /// Returns true if a scheme registration was refused.
    #[must_use]
    pub fn is_registration(&self) -> bool {
        matches!(self.inner.kind, Kind::Registration)
    }
}
