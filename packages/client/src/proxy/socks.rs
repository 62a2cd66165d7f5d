//! SOCKS5 client dialer
//!
//! CONNECT over a stream obtained from the forwarding dialer, with optional
//! username/password authentication.

use std::fmt;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use url::Url;

use crate::connect::{DialContext, DialFuture, Dialer, NetworkKind, split_host_port};
use crate::error::{self, Result};

/// Port used when a SOCKS URL does not carry one.
pub const DEFAULT_SOCKS_PORT: u16 = 1080;

const VERSION: u8 = 0x05;
const CMD_CONNECT: u8 = 0x01;
const METHOD_NO_AUTH: u8 = 0x00;
const METHOD_USERNAME_PASSWORD: u8 = 0x02;
const METHOD_NO_ACCEPTABLE: u8 = 0xFF;
const AUTH_VERSION: u8 = 0x01;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Username/password credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Auth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SOCKS5 protocol failures, carried as the source of an `io::Error`.
#[derive(Debug, thiserror::Error)]
pub enum SocksError {
    #[error("unexpected protocol version {0}")]
    Version(u8),
    #[error("no acceptable authentication methods")]
    NoAcceptableMethods,
    #[error("unsupported authentication method {0}")]
    UnsupportedMethod(u8),
    #[error("invalid username/password")]
    InvalidCredentials,
    #[error("username/password authentication failed")]
    AuthenticationFailed,
    #[error("host name too long: {0} bytes")]
    HostTooLong(usize),
    #[error("unknown address type {0}")]
    AddressType(u8),
    #[error("{}", reply_message(.0))]
    Rejected(u8),
}

fn reply_message(code: &u8) -> &'static str {
    match *code {
        0x01 => "general SOCKS server failure",
        0x02 => "connection not allowed by ruleset",
        0x03 => "network unreachable",
        0x04 => "host unreachable",
        0x05 => "connection refused",
        0x06 => "TTL expired",
        0x07 => "command not supported",
        0x08 => "address type not supported",
        _ => "unknown reply code",
    }
}

impl From<SocksError> for io::Error {
    fn from(err: SocksError) -> Self {
        let kind = match err {
            SocksError::Rejected(0x05) => io::ErrorKind::ConnectionRefused,
            SocksError::InvalidCredentials | SocksError::HostTooLong(_) => {
                io::ErrorKind::InvalidInput
            }
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// Dialer tunnelling TCP connections through a SOCKS5 proxy.
#[derive(Clone, Debug)]
pub struct Socks5Dialer {
    proxy_addr: String,
    auth: Option<Auth>,
    forward: Arc<dyn Dialer>,
}

impl Socks5Dialer {
    /// `proxy_addr` is the proxy's `host:port`; `forward` reaches it.
    ///
    /// # Errors
    ///
    /// Returns an error if `network` is not a TCP network or `proxy_addr`
    /// has no host or a malformed port.
    pub fn new(
        network: &str,
        proxy_addr: impl Into<String>,
        auth: Option<Auth>,
        forward: Arc<dyn Dialer>,
    ) -> Result<Self> {
        let proxy_addr = proxy_addr.into();
        NetworkKind::parse(network).map_err(|e| error::invalid_proxy_address(&proxy_addr, e))?;

        let (host, port) =
            split_host_port(&proxy_addr).map_err(|e| error::invalid_proxy_address(&proxy_addr, e))?;
        if host.is_empty() {
            return Err(error::invalid_proxy_address(&proxy_addr, "missing host"));
        }
        port.parse::<u16>()
            .map_err(|e| error::invalid_proxy_address(&proxy_addr, e))?;

        Ok(Self {
            proxy_addr,
            auth,
            forward,
        })
    }

    #[must_use]
    pub fn proxy_addr(&self) -> &str {
        &self.proxy_addr
    }

    #[must_use]
    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }
}

impl Dialer for Socks5Dialer {
    fn dial<'a>(&'a self, cx: &'a DialContext, network: &'a str, addr: &'a str) -> DialFuture<'a> {
        Box::pin(async move {
            NetworkKind::parse(network)?;
            let (host, port) = split_host_port(addr)?;
            let port: u16 = port.parse().map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("address {addr}: invalid port"),
                )
            })?;

            let mut stream = self.forward.dial(cx, "tcp", &self.proxy_addr).await?;
            cx.run(socks5_handshake(&mut stream, host, port, self.auth.as_ref()))
                .await?;
            Ok(stream)
        })
    }
}

/// Build a SOCKS5 dialer from a `socks://`, `socks5://` or `socks5h://` URL.
///
/// User-info becomes credentials as given; a missing password is an empty
/// one, not an error.
///
/// # Errors
///
/// Returns an error if the URL has no host.
pub fn socks_dialer_from_url(url: &Url, forward: Arc<dyn Dialer>) -> Result<Arc<dyn Dialer>> {
    let auth = (!url.username().is_empty() || url.password().is_some()).then(|| Auth {
        username: percent_decode(url.username()),
        password: url.password().map(percent_decode).unwrap_or_default(),
    });

    let host = url
        .host()
        .ok_or_else(|| error::invalid_proxy_address(url.as_str(), "missing host"))?;
    let port = url.port().unwrap_or(DEFAULT_SOCKS_PORT);

    let dialer = Socks5Dialer::new("tcp", format!("{host}:{port}"), auth, forward)?;
    Ok(Arc::new(dialer))
}

fn percent_decode(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |decoded| decoded.into_owned())
}

/// Perform the SOCKS5 method negotiation, optional authentication and
/// CONNECT request for `host:port` on `stream`.
pub async fn socks5_handshake<S>(
    stream: &mut S,
    host: &str,
    port: u16,
    auth: Option<&Auth>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if host.len() > 255 {
        return Err(SocksError::HostTooLong(host.len()).into());
    }

    // Method negotiation
    let greeting: &[u8] = if auth.is_some() {
        &[VERSION, 2, METHOD_NO_AUTH, METHOD_USERNAME_PASSWORD]
    } else {
        &[VERSION, 1, METHOD_NO_AUTH]
    };
    stream.write_all(greeting).await?;

    let mut choice = [0u8; 2];
    stream.read_exact(&mut choice).await?;
    if choice[0] != VERSION {
        return Err(SocksError::Version(choice[0]).into());
    }
    match (choice[1], auth) {
        (METHOD_NO_AUTH, _) => {}
        (METHOD_USERNAME_PASSWORD, Some(auth)) => authenticate(stream, auth).await?,
        (METHOD_NO_ACCEPTABLE, _) => return Err(SocksError::NoAcceptableMethods.into()),
        (method, _) => return Err(SocksError::UnsupportedMethod(method).into()),
    }

    // Connection request
    let mut request = Vec::with_capacity(6 + host.len() + 1);
    request.extend_from_slice(&[VERSION, CMD_CONNECT, 0x00]);
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ipv4)) => {
            request.push(ATYP_IPV4);
            request.extend_from_slice(&ipv4.octets());
        }
        Ok(IpAddr::V6(ipv6)) => {
            request.push(ATYP_IPV6);
            request.extend_from_slice(&ipv6.octets());
        }
        Err(_) => {
            request.push(ATYP_DOMAIN);
            request.push(host.len() as u8);
            request.extend_from_slice(host.as_bytes());
        }
    }
    request.extend_from_slice(&port.to_be_bytes());
    stream.write_all(&request).await?;

    let mut reply = [0u8; 4];
    stream.read_exact(&mut reply).await?;
    if reply[0] != VERSION {
        return Err(SocksError::Version(reply[0]).into());
    }
    if reply[1] != 0x00 {
        return Err(SocksError::Rejected(reply[1]).into());
    }

    // Skip the bound address
    let remaining = match reply[3] {
        ATYP_IPV4 => 4 + 2,
        ATYP_IPV6 => 16 + 2,
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await?;
            usize::from(len[0]) + 2
        }
        other => return Err(SocksError::AddressType(other).into()),
    };
    let mut bound = vec![0u8; remaining];
    stream.read_exact(&mut bound).await?;

    Ok(())
}

async fn authenticate<S>(stream: &mut S, auth: &Auth) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (user, pass) = (auth.username.as_bytes(), auth.password.as_bytes());
    if user.is_empty() || user.len() > 255 || pass.len() > 255 {
        return Err(SocksError::InvalidCredentials.into());
    }

    let mut request = Vec::with_capacity(3 + user.len() + pass.len());
    request.push(AUTH_VERSION);
    request.push(user.len() as u8);
    request.extend_from_slice(user);
    request.push(pass.len() as u8);
    request.extend_from_slice(pass);
    stream.write_all(&request).await?;

    let mut status = [0u8; 2];
    stream.read_exact(&mut status).await?;
    if status[1] != 0x00 {
        return Err(SocksError::AuthenticationFailed.into());
    }
    Ok(())
}
