use super::BoxError;
use super::types::{Error, Kind};

/// Creates an `Error` for a proxy URL that failed to parse.
pub fn invalid_url<E: Into<BoxError>>(url: &str, e: E) -> Error {
    Error::new(Kind::InvalidUrl).with(e.into()).with_subject(url)
}

/// Creates an `Error` for a scheme with no registered dialer constructor.
pub fn unsupported_scheme(scheme: &str) -> Error {
    Error::new(Kind::UnsupportedScheme).with_subject(scheme)
}

/// Creates an `Error` for a malformed proxy host or port.
pub fn invalid_proxy_address<E: Into<BoxError>>(addr: &str, e: E) -> Error {
    Error::new(Kind::InvalidProxyAddress)
        .with(e.into())
        .with_subject(addr)
}

/// Creates an `Error` for a rejected scheme registration.
pub fn registration<E: Into<BoxError>>(scheme: &str, e: E) -> Error {
    Error::new(Kind::Registration).with(e.into()).with_subject(scheme)
}
