//! Base platform identity facts
//!
//! Collected on every platform before any OS-specific collector runs: the
//! virtualization collector's distribution check depends on these facts
//! already being merged.

use serde_json::json;
use std::path::{Path, PathBuf};

use super::probe::{self, rooted};
use super::{FactError, FactMap};

/// Marker files that override the generic distribution probe. Present file
/// maps to the canonical name; the RedHat marker is refined further from the
/// file content.
const DIST_MARKERS: &[(&str, &str)] = &[
    ("/etc/redhat-release", "RedHat"),
    ("/etc/vmware-release", "VMwareESX"),
];

const SSH_HOST_KEYS: &[(&str, &str)] = &[
    ("ssh_host_key_dsa_public", "/etc/ssh/ssh_host_dsa_key.pub"),
    ("ssh_host_key_rsa_public", "/etc/ssh/ssh_host_rsa_key.pub"),
];

pub struct BaseFacts {
    root: PathBuf,
}

impl Default for BaseFacts {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseFacts {
    pub fn new() -> Self {
        Self::with_root("/")
    }

    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub async fn collect(&self) -> Result<FactMap, FactError> {
        let mut facts = FactMap::new();

        for (key, arg) in [("system", "-s"), ("kernel", "-r"), ("machine", "-m")] {
            let out = probe::run_command(&["uname", arg]).await;
            if out.success() && !out.stdout.trim().is_empty() {
                facts.insert(key.to_string(), json!(out.stdout.trim()));
            }
        }

        let machine = facts
            .get("machine")
            .and_then(|v| v.as_str())
            .map(normalize_architecture);
        if let Some(architecture) = machine {
            facts.insert("architecture".to_string(), json!(architecture));
        }

        let fqdn = self.fqdn().await;
        let short = fqdn.split('.').next().unwrap_or(&fqdn).to_string();
        facts.insert("fqdn".to_string(), json!(fqdn));
        facts.insert("hostname".to_string(), json!(short));

        facts.extend(self.distribution_facts().await);

        for (key, path) in SSH_HOST_KEYS {
            if let Some(content) = probe::read_file(rooted(&self.root, path)).await {
                if let Some(field) = content.split_whitespace().nth(1) {
                    facts.insert(key.to_string(), json!(field));
                }
            }
        }

        facts.insert("selinux".to_string(), self.selinux_status().await);

        Ok(facts)
    }

    async fn fqdn(&self) -> String {
        let out = probe::run_command(&["hostname", "-f"]).await;
        let fqdn = out.stdout.trim();
        if out.success() && !fqdn.is_empty() {
            return fqdn.to_string();
        }
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string())
    }

    async fn distribution_facts(&self) -> FactMap {
        let mut facts = FactMap::new();

        if let Some(os_release) = probe::read_file(rooted(&self.root, "/etc/os-release")).await {
            facts.extend(parse_os_release(&os_release));
        }

        for (path, name) in DIST_MARKERS {
            if !probe::path_exists(rooted(&self.root, path)).await {
                continue;
            }
            // Fedora ships a redhat-release marker but keeps its own name.
            if facts.get("distribution").and_then(|v| v.as_str()) == Some("Fedora") {
                continue;
            }
            if *name == "RedHat" {
                match probe::read_file(rooted(&self.root, path)).await {
                    Some(content) if !content.contains("Red Hat") => {
                        if let Some(token) = content.split_whitespace().next() {
                            facts.insert("distribution".to_string(), json!(token));
                        }
                    }
                    _ => {
                        facts.insert("distribution".to_string(), json!(name));
                    }
                }
            } else {
                facts.insert("distribution".to_string(), json!(name));
            }
        }

        facts
    }

    /// SELinux status: boolean false when the module is absent, otherwise one
    /// of disabled / permissive / enforcing / enabled.
    async fn selinux_status(&self) -> serde_json::Value {
        if !probe::path_exists(rooted(&self.root, "/sys/fs/selinux")).await {
            return json!(false);
        }
        if let Some(config) = probe::read_file(rooted(&self.root, "/etc/selinux/config")).await {
            let disabled = config
                .lines()
                .map(str::trim)
                .any(|line| line == "SELINUX=disabled");
            if disabled {
                return json!("disabled");
            }
        }
        match probe::read_file(rooted(&self.root, "/sys/fs/selinux/enforce"))
            .await
            .as_deref()
        {
            Some("1") => json!("enforcing"),
            Some("0") => json!("permissive"),
            _ => json!("enabled"),
        }
    }
}

/// Normalize i386-family machine strings; everything else passes through.
fn normalize_architecture(machine: &str) -> String {
    match machine {
        "i386" | "i486" | "i586" | "i686" => "i386".to_string(),
        other => other.to_string(),
    }
}

fn parse_os_release(content: &str) -> FactMap {
    let mut facts = FactMap::new();

    for line in content.lines() {
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim_matches('"');
            match key {
                "ID" => {
                    facts.insert(
                        "distribution".to_string(),
                        json!(normalize_distribution(value)),
                    );
                }
                "VERSION_ID" => {
                    facts.insert("distribution_version".to_string(), json!(value));
                }
                "VERSION_CODENAME" => {
                    facts.insert("distribution_release".to_string(), json!(value));
                }
                _ => {}
            }
        }
    }

    facts
}

fn normalize_distribution(dist: &str) -> String {
    match dist.to_lowercase().as_str() {
        "ubuntu" => "Ubuntu".to_string(),
        "debian" => "Debian".to_string(),
        "centos" => "CentOS".to_string(),
        "rhel" | "redhat" => "RedHat".to_string(),
        "fedora" => "Fedora".to_string(),
        "opensuse" | "suse" => "SUSE".to_string(),
        "arch" => "Archlinux".to_string(),
        "alpine" => "Alpine".to_string(),
        _ => dist.to_string(),
    }
}
