//! Linux network facts
//!
//! Interface names come from /proc/net/dev, MAC and MTU from the per-device
//! sysfs leaves, IPv4 assignments from `ifconfig <iface>` text in either of
//! its two historical shapes, and IPv6 assignments from the fixed-width
//! /proc/net/if_inet6 records.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

use super::NetworkFacts;
use crate::facts::probe::{self, rooted};
use crate::facts::{FactError, FactMap, InterfaceIpv4, InterfaceIpv6};
use async_trait::async_trait;

// Legacy net-tools shape: "inet addr:192.168.1.10  Bcast:... Mask:255.255.255.0"
static INET_ADDR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"inet addr:(\S+).*Mask:(\S+)").unwrap());

// Newer shape: "inet 192.168.1.10  netmask 255.255.255.0  broadcast ..."
static INET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"inet (\S+)\s+netmask (\S+)").unwrap());

pub struct LinuxNetwork {
    root: PathBuf,
}

impl LinuxNetwork {
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl NetworkFacts for LinuxNetwork {
    fn platform(&self) -> &'static str {
        "Linux"
    }

    async fn collect(&self) -> Result<FactMap, FactError> {
        let mut facts = FactMap::new();

        let interfaces = self.interface_names().await;
        facts.insert("interfaces".to_string(), json!(interfaces));

        let if_inet6 = probe::read_file(rooted(&self.root, "/proc/net/if_inet6")).await;

        for iface in &interfaces {
            let mut record = serde_json::Map::new();

            let sysfs = rooted(&self.root, &format!("/sys/class/net/{iface}"));
            if let Some(mac) = probe::read_file(sysfs.join("address")).await {
                record.insert("macaddress".to_string(), json!(mac));
            }
            if let Some(mtu) = probe::read_file(sysfs.join("mtu")).await {
                if let Ok(mtu) = mtu.parse::<u32>() {
                    record.insert("mtu".to_string(), json!(mtu));
                }
            }

            // No matching inet line simply means no ipv4 fact for this
            // interface; that is expected for down or unconfigured devices.
            let ifconfig = probe::run_command(&["ifconfig", iface]).await;
            if ifconfig.success() {
                if let Some(ipv4) = parse_ifconfig_inet(&ifconfig.stdout) {
                    record.insert("ipv4".to_string(), json!(ipv4));
                }
            }

            if let Some(content) = &if_inet6 {
                let entries = parse_if_inet6(content, iface);
                if !entries.is_empty() {
                    record.insert("ipv6".to_string(), json!(entries));
                }
            }

            facts.insert(iface.clone(), serde_json::Value::Object(record));
        }

        Ok(facts)
    }
}

impl LinuxNetwork {
    async fn interface_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(dev) = probe::read_file(rooted(&self.root, "/proc/net/dev")).await {
            for line in dev.lines() {
                if let Some((name, _)) = line.split_once(':') {
                    names.push(name.trim().to_string());
                }
            }
        }
        names
    }
}

/// Match an ifconfig dump against the two recognized IPv4 line shapes and
/// derive the network address from address and mask.
pub(crate) fn parse_ifconfig_inet(output: &str) -> Option<InterfaceIpv4> {
    for line in output.lines() {
        let Some(captures) = INET_ADDR_RE
            .captures(line)
            .or_else(|| INET_RE.captures(line))
        else {
            continue;
        };
        let address = captures[1].to_string();
        let netmask = captures[2].to_string();
        let network = network_address(&address, &netmask)?;
        return Some(InterfaceIpv4 {
            address,
            netmask,
            network,
        });
    }
    None
}

/// Dotted-decimal of `address & netmask`.
pub(crate) fn network_address(address: &str, netmask: &str) -> Option<String> {
    let addr: Ipv4Addr = address.parse().ok()?;
    let mask: Ipv4Addr = netmask.parse().ok()?;
    Some(Ipv4Addr::from(u32::from(addr) & u32::from(mask)).to_string())
}

/// Parse the fixed-width /proc/net/if_inet6 records for one interface:
/// 32 hex digits of address, interface index, prefix length (hex), scope
/// code (hex), flags, interface name.
pub(crate) fn parse_if_inet6(content: &str, iface: &str) -> Vec<InterfaceIpv6> {
    let mut entries = Vec::new();

    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 6 || fields[5] != iface {
            continue;
        }
        let Some(address) = normalize_ipv6(fields[0]) else {
            continue;
        };
        let Ok(prefix) = u8::from_str_radix(fields[2], 16) else {
            continue;
        };
        entries.push(InterfaceIpv6 {
            address,
            prefix,
            scope: scope_name(fields[3]),
        });
    }

    entries
}

/// Regroup the 32-hex-digit kernel form into colon-separated quads and
/// normalize through standard address parsing.
fn normalize_ipv6(hex: &str) -> Option<String> {
    if hex.len() != 32 {
        return None;
    }
    let grouped = hex
        .as_bytes()
        .chunks(4)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(":");
    grouped.parse::<Ipv6Addr>().ok().map(|a| a.to_string())
}

/// Numeric scope codes from if_inet6; codes not in the table pass through as
/// their raw string.
fn scope_name(code: &str) -> String {
    let trimmed = code.trim_start_matches('0');
    let key = if trimmed.is_empty() { "0" } else { trimmed };
    match key {
        "0" => "global",
        "10" => "host",
        "20" => "link",
        "40" => "admin",
        "50" => "site",
        "80" => "organization",
        _ => return code.to_string(),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_from_address_and_mask() {
        assert_eq!(
            network_address("192.168.1.10", "255.255.255.0").as_deref(),
            Some("192.168.1.0")
        );
        assert_eq!(
            network_address("10.20.30.40", "255.255.0.0").as_deref(),
            Some("10.20.0.0")
        );
        assert_eq!(network_address("not-an-ip", "255.0.0.0"), None);
    }

    #[test]
    fn legacy_inet_addr_shape() {
        let out = "eth0      Link encap:Ethernet  HWaddr 00:16:3e:aa:bb:cc\n          \
                   inet addr:192.168.1.10  Bcast:192.168.1.255  Mask:255.255.255.0\n";
        let ipv4 = parse_ifconfig_inet(out).unwrap();
        assert_eq!(ipv4.address, "192.168.1.10");
        assert_eq!(ipv4.netmask, "255.255.255.0");
        assert_eq!(ipv4.network, "192.168.1.0");
    }

    #[test]
    fn modern_inet_netmask_shape() {
        let out = "eth0: flags=4163<UP,BROADCAST,RUNNING,MULTICAST>  mtu 1500\n        \
                   inet 10.0.0.5  netmask 255.255.255.0  broadcast 10.0.0.255\n";
        let ipv4 = parse_ifconfig_inet(out).unwrap();
        assert_eq!(ipv4.address, "10.0.0.5");
        assert_eq!(ipv4.network, "10.0.0.0");
    }

    #[test]
    fn no_matching_line_is_none() {
        let out = "lo: flags=73<UP,LOOPBACK,RUNNING>  mtu 65536\n";
        assert!(parse_ifconfig_inet(out).is_none());
    }

    #[test]
    fn if_inet6_records_for_interface() {
        let content = "\
fe8000000000000002163efffeaabbcc 02 40 20 80     eth0
00000000000000000000000000000001 01 80 10 80       lo
";
        let entries = parse_if_inet6(content, "eth0");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address, "fe80::216:3eff:feaa:bbcc");
        assert_eq!(entries[0].prefix, 64);
        assert_eq!(entries[0].scope, "link");

        let lo = parse_if_inet6(content, "lo");
        assert_eq!(lo[0].address, "::1");
        assert_eq!(lo[0].prefix, 128);
        assert_eq!(lo[0].scope, "host");
    }

    #[test]
    fn unknown_scope_code_passes_through_raw() {
        assert_eq!(scope_name("00"), "global");
        assert_eq!(scope_name("20"), "link");
        assert_eq!(scope_name("f0"), "f0");
    }
}
