//! Settlement network presets and host classification.
//!
//! A process settles on exactly one network. The preset pins the token the
//! price is denominated in, its decimals, and where payer activity can be
//! inspected. The host helpers back SSRF checks on delegated-payment targets.

use alloy_primitives::{address, Address};
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::CredpayError;

/// Runtime network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// x402 network identifier, e.g. `base-sepolia`.
    pub name: String,
    pub chain_id: u64,
    /// Token the price is paid in.
    pub asset: Address,
    /// EIP-712 domain name of the token contract.
    pub asset_name: String,
    /// EIP-712 domain version of the token contract.
    pub asset_version: String,
    pub decimals: u32,
    pub explorer_base: String,
}

impl NetworkConfig {
    /// Base Sepolia testnet, paying in USDC.
    pub fn base_sepolia() -> Self {
        Self {
            name: "base-sepolia".to_string(),
            chain_id: 84532,
            asset: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
            asset_name: "USDC".to_string(),
            asset_version: "2".to_string(),
            decimals: 6,
            explorer_base: "https://sepolia.basescan.org".to_string(),
        }
    }

    /// Base mainnet, paying in USDC.
    pub fn base() -> Self {
        Self {
            name: "base".to_string(),
            chain_id: 8453,
            asset: address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            asset_name: "USD Coin".to_string(),
            asset_version: "2".to_string(),
            decimals: 6,
            explorer_base: "https://basescan.org".to_string(),
        }
    }

    /// Resolve a preset by its x402 network identifier.
    pub fn from_name(name: &str) -> Result<Self, CredpayError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "base-sepolia" => Ok(Self::base_sepolia()),
            "base" => Ok(Self::base()),
            other => Err(CredpayError::Config(format!("unsupported network: {other}"))),
        }
    }

    /// Explorer page for an address on this network.
    pub fn explorer_address_url(&self, address: &Address) -> String {
        format!(
            "{}/address/{:#x}",
            self.explorer_base.trim_end_matches('/'),
            address
        )
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::base_sepolia()
    }
}

/// Check if an IPv4 address is private, loopback, or otherwise non-routable.
///
/// Covers: loopback (127.0.0.0/8), RFC 1918 private ranges, link-local
/// (169.254.0.0/16), broadcast, unspecified (0.0.0.0), and CGNAT (100.64.0.0/10).
pub fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_unspecified()
        || (ip.octets()[0] == 100 && (ip.octets()[1] & 0xC0) == 64)
}

/// Check if an IPv6 address is private, loopback, or otherwise non-routable.
pub fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    ip.is_loopback() || ip.is_unspecified() || {
        let segments = ip.segments();
        (segments[0] & 0xFE00) == 0xFC00
            || (segments[0] & 0xFFC0) == 0xFE80
            || match ip.to_ipv4_mapped() {
                Some(v4) => is_private_ipv4(&v4),
                None => false,
            }
    }
}

/// Check if a URL host points at this machine or a private network.
pub fn is_private_host(host: &url::Host<&str>) -> bool {
    match host {
        url::Host::Ipv4(ip) => is_private_ipv4(ip),
        url::Host::Ipv6(ip) => is_private_ipv6(ip),
        url::Host::Domain(domain) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost"
                || domain.ends_with(".localhost")
                || domain.ends_with(".local")
                || domain.ends_with(".internal")
        }
    }
}
