// Network utilities - Target parsing and DNS resolution

use crate::error::DrownError;
use crate::Result;
use hickory_resolver::config::*;
use hickory_resolver::TokioAsyncResolver;
use std::net::{IpAddr, SocketAddr};

/// Default port when the target names none
pub const DEFAULT_PORT: u16 = 443;

/// Target information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
    pub ip_addresses: Vec<IpAddr>,
}

impl Target {
    /// Parse target from string (host:port, URL or just host) and resolve it
    pub async fn parse(input: &str) -> Result<Self> {
        let (hostname, port) = split_host_port(input)?;
        let ip_addresses = resolve_hostname(&hostname).await?;

        Ok(Self {
            hostname,
            port,
            ip_addresses,
        })
    }

    /// Address the attack connects to (first resolved IP)
    pub fn primary_addr(&self) -> Result<SocketAddr> {
        self.ip_addresses
            .first()
            .map(|ip| SocketAddr::new(*ip, self.port))
            .ok_or_else(|| DrownError::InvalidInput {
                message: format!("No IP addresses for {}", self.hostname),
            })
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// Split a target string into hostname and port without resolving it
pub fn split_host_port(input: &str) -> Result<(String, u16)> {
    let invalid = |message: String| DrownError::InvalidInput { message };

    let (hostname, port) = if input.contains("://") {
        // URL format (https://example.com:443)
        let url = url::Url::parse(input)
            .map_err(|e| invalid(format!("Invalid target URL {}: {}", input, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| invalid(format!("No hostname in URL {}", input)))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        (host, url.port().unwrap_or(DEFAULT_PORT))
    } else if let Ok(ip) = input.parse::<IpAddr>() {
        // Bare IPv6 contains colons
        (ip.to_string(), DEFAULT_PORT)
    } else if let Ok(addr) = input.parse::<SocketAddr>() {
        (addr.ip().to_string(), addr.port())
    } else if let Some((host, port_str)) = input.rsplit_once(':') {
        let port = port_str
            .parse::<u16>()
            .map_err(|_| invalid(format!("Invalid port number: {}", port_str)))?;
        (host.to_string(), port)
    } else {
        (input.to_string(), DEFAULT_PORT)
    };

    if hostname.is_empty() {
        return Err(invalid(format!("Empty hostname in target {}", input)));
    }
    Ok((hostname, port))
}

/// Resolve hostname to IP addresses
pub async fn resolve_hostname(hostname: &str) -> Result<Vec<IpAddr>> {
    // Check if it's already an IP address
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    // Use hickory-resolver for async DNS
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    let response = resolver
        .lookup_ip(hostname)
        .await
        .map_err(|e| DrownError::ProbeIncomplete {
            details: format!("DNS lookup for {} failed: {}", hostname, e),
        })?;

    let ips: Vec<IpAddr> = response.iter().collect();

    if ips.is_empty() {
        return Err(DrownError::ProbeIncomplete {
            details: format!("No IP addresses found for {}", hostname),
        });
    }

    Ok(ips)
}
