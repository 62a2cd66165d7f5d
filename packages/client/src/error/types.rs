use std::error::Error as StdError;
use std::fmt;

/// A Result alias where the Err case is `peerdial_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors raised while building a dialer chain.
///
/// Dial failures are never reported through this type; they surface as
/// plain `std::io::Error` so callers can inspect the transport error kind.
pub struct Error {
    pub inner: Box<Inner>,
}

pub struct Inner {
    pub kind: Kind,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Proxy URL could not be parsed
    InvalidUrl,
    /// No dialer constructor is registered for the URL scheme
    UnsupportedScheme,
    /// Proxy host or port is malformed
    InvalidProxyAddress,
    /// Scheme registration was rejected
    Registration,
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                subject: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    /// Attach the offending input (URL, scheme, address) for diagnostics.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Error {
        self.inner.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.inner.subject.as_deref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("peerdial_client::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref subject) = self.inner.subject {
            f.field("subject", subject);
        }

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.inner.kind {
            Kind::InvalidUrl => "invalid proxy url",
            Kind::UnsupportedScheme => "unsupported proxy scheme",
            Kind::InvalidProxyAddress => "invalid proxy address",
            Kind::Registration => "proxy scheme registration failed",
        };
        match (&self.inner.subject, &self.inner.source) {
            (Some(subject), Some(source)) => write!(f, "{prefix} {subject:?}: {source}"),
            (Some(subject), None) => write!(f, "{prefix} {subject:?}"),
            (None, Some(source)) => write!(f, "{prefix}: {source}"),
            (None, None) => f.write_str(prefix),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
