//! Linux hardware facts from /proc and DMI sysfs

use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::HardwareFacts;
use crate::facts::probe::{self, rooted};
use crate::facts::{FactError, FactMap};
use async_trait::async_trait;

/// SMBIOS chassis-type codes, indexed directly by the numeric code.
const FORM_FACTORS: &[&str] = &[
    "Unknown",
    "Other",
    "Unknown",
    "Desktop",
    "Low Profile Desktop",
    "Pizza Box",
    "Mini Tower",
    "Tower",
    "Portable",
    "Laptop",
    "Notebook",
    "Hand Held",
    "Docking Station",
    "All In One",
    "Sub Notebook",
    "Space-saving",
    "Lunch Box",
    "Main Server Chassis",
    "Expansion Chassis",
    "Sub Chassis",
    "Bus Expansion Chassis",
    "Peripheral Chassis",
    "RAID Chassis",
    "Rack Mount Chassis",
    "Sealed-case PC",
    "Multi-system",
    "CompactPCI",
    "AdvancedTCA",
];

/// DMI sysfs leaves and the fact key each one feeds.
const DMI_PATHS: &[(&str, &str)] = &[
    ("product_name", "/sys/devices/virtual/dmi/id/product_name"),
    ("product_serial", "/sys/devices/virtual/dmi/id/product_serial"),
    ("product_uuid", "/sys/devices/virtual/dmi/id/product_uuid"),
    ("product_version", "/sys/devices/virtual/dmi/id/product_version"),
    ("system_vendor", "/sys/devices/virtual/dmi/id/sys_vendor"),
    ("bios_date", "/sys/devices/virtual/dmi/id/bios_date"),
    ("bios_version", "/sys/devices/virtual/dmi/id/bios_version"),
];

pub struct LinuxHardware {
    root: PathBuf,
}

impl LinuxHardware {
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl HardwareFacts for LinuxHardware {
    fn platform(&self) -> &'static str {
        "Linux"
    }

    async fn collect(&self) -> Result<FactMap, FactError> {
        let mut facts = FactMap::new();

        if let Some(meminfo) = probe::read_file(rooted(&self.root, "/proc/meminfo")).await {
            facts.extend(parse_meminfo(&meminfo));
        }

        if let Some(cpuinfo) = probe::read_file(rooted(&self.root, "/proc/cpuinfo")).await {
            facts.extend(parse_cpuinfo(&cpuinfo));
        }

        facts.extend(self.dmi_facts().await);

        Ok(facts)
    }
}

impl LinuxHardware {
    /// Each DMI leaf maps to a fact; an absent path yields the literal "NA"
    /// rather than an omitted key.
    async fn dmi_facts(&self) -> FactMap {
        let mut facts = FactMap::new();

        let chassis = probe::read_file(rooted(&self.root, "/sys/devices/virtual/dmi/id/chassis_type"))
            .await
            .and_then(|code| chassis_form_factor(&code));
        facts.insert(
            "form_factor".to_string(),
            json!(chassis.unwrap_or_else(|| "NA".to_string())),
        );

        for (key, path) in DMI_PATHS {
            let value = probe::read_file(rooted(&self.root, path)).await;
            facts.insert(
                key.to_string(),
                json!(value.unwrap_or_else(|| "NA".to_string())),
            );
        }

        facts
    }
}

/// Raw kB counters from /proc/meminfo, floor-divided to whole megabytes.
fn parse_meminfo(meminfo: &str) -> FactMap {
    let mut facts = FactMap::new();

    for line in meminfo.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let fact = match key.trim() {
                "MemTotal" => "memtotal_mb",
                "MemFree" => "memfree_mb",
                "SwapTotal" => "swaptotal_mb",
                "SwapFree" => "swapfree_mb",
                _ => continue,
            };
            if let Some(kb) = value
                .split_whitespace()
                .next()
                .and_then(|s| s.parse::<u64>().ok())
            {
                facts.insert(fact.to_string(), json!(kb / 1024));
            }
        }
    }

    facts
}

/// Socket and core counts from the per-logical-CPU record stream.
///
/// A running `physical id` is tracked; each `cpu cores` field is recorded
/// against the most recent id seen. When no socket information is present the
/// processor count falls back to the number of model-name lines and the core
/// count degrades to "NA".
fn parse_cpuinfo(cpuinfo: &str) -> FactMap {
    let mut facts = FactMap::new();
    let mut models: Vec<String> = Vec::new();
    let mut sockets: HashMap<String, u64> = HashMap::new();
    let mut physical_id: Option<String> = None;

    for line in cpuinfo.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim();
            match key.trim() {
                "model name" => models.push(value.to_string()),
                "physical id" => physical_id = Some(value.to_string()),
                "cpu cores" => {
                    if let (Some(id), Ok(cores)) = (&physical_id, value.parse::<u64>()) {
                        sockets.insert(id.clone(), cores);
                    }
                }
                _ => {}
            }
        }
    }

    facts.insert("processor".to_string(), json!(models));
    if sockets.is_empty() {
        facts.insert("processor_count".to_string(), json!(models.len()));
        facts.insert("processor_cores".to_string(), json!("NA"));
    } else {
        facts.insert("processor_count".to_string(), json!(sockets.len()));
        facts.insert(
            "processor_cores".to_string(),
            json!(sockets.values().sum::<u64>()),
        );
    }

    facts
}

fn chassis_form_factor(code: &str) -> Option<String> {
    let index = code.parse::<usize>().ok()?;
    FORM_FACTORS.get(index).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn meminfo_floor_divides_to_mb() {
        let facts = parse_meminfo(
            "MemTotal:      2048000 kB\n\
             MemFree:        511500 kB\n\
             SwapTotal:     1048576 kB\n\
             SwapFree:      1048000 kB\n\
             Cached:         123456 kB\n",
        );
        assert_eq!(facts["memtotal_mb"], json!(2000));
        assert_eq!(facts["memfree_mb"], json!(499));
        assert_eq!(facts["swaptotal_mb"], json!(1024));
        assert_eq!(facts["swapfree_mb"], json!(1023));
        assert!(!facts.contains_key("cached_mb"));
    }

    #[test]
    fn cpuinfo_sums_cores_across_sockets() {
        let cpuinfo = "\
processor\t: 0
model name\t: Intel(R) Xeon(R) CPU
physical id\t: 0
cpu cores\t: 4

processor\t: 1
model name\t: Intel(R) Xeon(R) CPU
physical id\t: 1
cpu cores\t: 6
";
        let facts = parse_cpuinfo(cpuinfo);
        assert_eq!(facts["processor_count"], json!(2));
        assert_eq!(facts["processor_cores"], json!(10));
    }

    #[test]
    fn cpuinfo_without_physical_ids_falls_back_to_model_lines() {
        let cpuinfo = "\
model name\t: QEMU Virtual CPU version 1.0
model name\t: QEMU Virtual CPU version 1.0
model name\t: QEMU Virtual CPU version 1.0
";
        let facts = parse_cpuinfo(cpuinfo);
        assert_eq!(facts["processor_count"], json!(3));
        assert_eq!(facts["processor_cores"], json!("NA"));
    }

    #[test]
    fn cpuinfo_duplicate_socket_records_count_once() {
        let cpuinfo = "\
model name\t: Intel CPU
physical id\t: 0
cpu cores\t: 4
model name\t: Intel CPU
physical id\t: 0
cpu cores\t: 4
";
        let facts = parse_cpuinfo(cpuinfo);
        assert_eq!(facts["processor_count"], json!(1));
        assert_eq!(facts["processor_cores"], json!(4));
    }

    #[test]
    fn chassis_code_3_is_desktop() {
        assert_eq!(chassis_form_factor("3").as_deref(), Some("Desktop"));
        assert_eq!(
            chassis_form_factor("23").as_deref(),
            Some("Rack Mount Chassis")
        );
        assert_eq!(chassis_form_factor("999"), None);
        assert_eq!(chassis_form_factor("bogus"), None);
    }

    #[tokio::test]
    async fn missing_dmi_paths_yield_na() {
        let root = TempDir::new().unwrap();
        let facts = LinuxHardware::with_root(root.path()).dmi_facts().await;
        assert_eq!(facts["form_factor"], json!("NA"));
        assert_eq!(facts["system_vendor"], json!("NA"));
        assert_eq!(facts["bios_version"], json!("NA"));
    }

    #[tokio::test]
    async fn dmi_values_read_from_sysfs_leaves() {
        let root = TempDir::new().unwrap();
        let dmi = root.path().join("sys/devices/virtual/dmi/id");
        fs::create_dir_all(&dmi).unwrap();
        fs::write(dmi.join("chassis_type"), "3\n").unwrap();
        fs::write(dmi.join("sys_vendor"), "Dell Inc.\n").unwrap();

        let facts = LinuxHardware::with_root(root.path()).dmi_facts().await;
        assert_eq!(facts["form_factor"], json!("Desktop"));
        assert_eq!(facts["system_vendor"], json!("Dell Inc."));
        assert_eq!(facts["product_name"], json!("NA"));
    }
}
