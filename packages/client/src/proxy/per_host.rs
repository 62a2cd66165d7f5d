//! Per-host proxy exclusion
//!
//! Routes a dial to the bypass dialer when the destination host matches
//! the exclusion list, otherwise to the default (proxy) dialer.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use crate::connect::{DialContext, DialFuture, Dialer, split_host_port};

/// Dialer that bypasses the proxy for excluded destinations.
#[derive(Clone, Debug)]
pub struct PerHost {
    default: Arc<dyn Dialer>,
    bypass: Arc<dyn Dialer>,
    bypass_all: bool,
    networks: Vec<(IpAddr, u8)>,
    ips: Vec<IpAddr>,
    zones: Vec<String>,
    hosts: Vec<String>,
}

impl PerHost {
    #[must_use]
    pub fn new(default: Arc<dyn Dialer>, bypass: Arc<dyn Dialer>) -> Self {
        Self {
            default,
            bypass,
            bypass_all: false,
            networks: Vec::new(),
            ips: Vec::new(),
            zones: Vec::new(),
            hosts: Vec::new(),
        }
    }

    /// Add rules from a `no_proxy` style string.
    ///
    /// The rules are as follows:
    /// * Entries are comma-separated; surrounding whitespace is ignored
    /// * `*` alone bypasses the proxy for every destination
    /// * Entries containing `/` are CIDR networks, e.g. `192.168.1.0/24`
    ///   (malformed ones are skipped)
    /// * IP addresses (IPv4 or IPv6) match exactly
    /// * `*.example.com` and `.example.com` match `example.com` and every
    ///   subdomain
    /// * Any other entry is an exact host name
    pub fn add_from_string(&mut self, list: &str) {
        for entry in list.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }

            if entry == "*" {
                self.bypass_all = true;
                continue;
            }

            if entry.contains('/') {
                if let Some((network, prefix_len)) = parse_cidr_pattern(entry) {
                    self.add_network(network, prefix_len);
                }
                continue;
            }

            if let Ok(ip) = entry.parse::<IpAddr>() {
                self.add_ip(ip);
                continue;
            }

            if let Some(zone) = entry.strip_prefix('*') {
                self.add_zone(zone);
                continue;
            }

            if entry.starts_with('.') {
                self.add_zone(entry);
                continue;
            }

            self.add_host(entry);
        }
    }

    pub fn add_network(&mut self, network: IpAddr, prefix_len: u8) {
        self.networks.push((network, prefix_len));
    }

    pub fn add_ip(&mut self, ip: IpAddr) {
        self.ips.push(ip);
    }

    /// Bypass `zone` and all its subdomains.
    pub fn add_zone(&mut self, zone: &str) {
        let zone = zone.trim_end_matches('.').to_ascii_lowercase();
        let zone = if zone.starts_with('.') {
            zone
        } else {
            format!(".{zone}")
        };
        self.zones.push(zone);
    }

    pub fn add_host(&mut self, host: &str) {
        self.hosts
            .push(host.trim_end_matches('.').to_ascii_lowercase());
    }

    /// Whether `host` (no port) is excluded from proxying.
    #[must_use]
    pub fn bypasses(&self, host: &str) -> bool {
        if self.bypass_all {
            return true;
        }

        if let Ok(ip) = host.parse::<IpAddr>() {
            return self
                .networks
                .iter()
                .any(|(network, prefix_len)| ip_in_subnet(ip, *network, *prefix_len))
                || self.ips.contains(&ip);
        }

        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.zones
            .iter()
            .any(|zone| host.ends_with(zone.as_str()) || host == zone[1..])
            || self.hosts.contains(&host)
    }

    fn dialer_for_host(&self, host: &str) -> &Arc<dyn Dialer> {
        if self.bypasses(host) {
            &self.bypass
        } else {
            &self.default
        }
    }
}

impl Dialer for PerHost {
    fn dial<'a>(&'a self, cx: &'a DialContext, network: &'a str, addr: &'a str) -> DialFuture<'a> {
        Box::pin(async move {
            let (host, _) = split_host_port(addr)?;
            self.dialer_for_host(host).dial(cx, network, addr).await
        })
    }
}

/// Parse a CIDR pattern (e.g., "192.168.1.0/24" or "2001:db8::/32")
/// Returns Some((network_address, prefix_length)) if valid CIDR notation, None otherwise
fn parse_cidr_pattern(pattern: &str) -> Option<(IpAddr, u8)> {
    let (network_str, prefix_str) = pattern.split_once('/')?;
    let network_addr = network_str.parse::<IpAddr>().ok()?;
    let prefix_len = prefix_str.parse::<u8>().ok()?;

    let max_prefix = match network_addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };

    (prefix_len <= max_prefix).then_some((network_addr, prefix_len))
}

/// Check if an IP address is within a subnet
fn ip_in_subnet(ip: IpAddr, network: IpAddr, prefix_len: u8) -> bool {
    match (ip, network) {
        (IpAddr::V4(ip_v4), IpAddr::V4(net_v4)) => ipv4_in_subnet(ip_v4, net_v4, prefix_len),
        (IpAddr::V6(ip_v6), IpAddr::V6(net_v6)) => ipv6_in_subnet(ip_v6, net_v6, prefix_len),
        _ => false, // Different IP versions don't match
    }
}

fn ipv4_in_subnet(ip: Ipv4Addr, network: Ipv4Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let mask = u32::MAX << (32 - u32::from(prefix_len));
    (u32::from(ip) & mask) == (u32::from(network) & mask)
}

fn ipv6_in_subnet(ip: Ipv6Addr, network: Ipv6Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let mask = u128::MAX << (128 - u32::from(prefix_len));
    (u128::from(ip) & mask) == (u128::from(network) & mask)
}
