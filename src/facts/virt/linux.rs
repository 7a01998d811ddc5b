//! Linux virtualization detection
//!
//! Evidence sources are consulted in a fixed order and each match overwrites
//! whatever an earlier check concluded; the final match wins. The order is
//! part of the observable contract and asserted by tests, so keep new checks
//! at the position their evidence class belongs to.

use serde_json::json;
use std::path::{Path, PathBuf};

use super::VirtualFacts;
use crate::facts::probe::{self, rooted};
use crate::facts::{FactError, FactMap, FactSet};
use async_trait::async_trait;

pub struct LinuxVirtual {
    root: PathBuf,
}

impl LinuxVirtual {
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[derive(Default)]
struct Verdict {
    vtype: Option<&'static str>,
    role: Option<&'static str>,
}

impl Verdict {
    fn set(&mut self, vtype: &'static str, role: &'static str) {
        self.vtype = Some(vtype);
        self.role = Some(role);
    }
}

#[async_trait]
impl VirtualFacts for LinuxVirtual {
    fn platform(&self) -> &'static str {
        "Linux"
    }

    async fn collect(&self, merged: &FactSet) -> Result<FactMap, FactError> {
        let mut verdict = Verdict::default();

        // 1. Xen pseudo-filesystem: guest unless the control capabilities
        //    sub-path marks this node as the hypervisor itself.
        if probe::path_exists(rooted(&self.root, "/proc/xen")).await {
            verdict.set("xen", "guest");
            if probe::path_exists(rooted(&self.root, "/proc/xen/capabilities")).await {
                verdict.set("xen", "host");
            }
        }

        // 2. Loaded kernel modules, scanned in list order so a later line
        //    overrides an earlier one like every other check here.
        if let Some(modules) = probe::read_file(rooted(&self.root, "/proc/modules")).await {
            for name in modules
                .lines()
                .filter_map(|line| line.split_whitespace().next())
            {
                match name {
                    "kvm" => verdict.set("kvm", "host"),
                    "vboxdrv" => verdict.set("virtualbox", "host"),
                    "vboxguest" => verdict.set("virtualbox", "guest"),
                    _ => {}
                }
            }
        }

        // 3. Hypervisor vendor markers in cpuinfo.
        if let Some(cpuinfo) = probe::read_file(rooted(&self.root, "/proc/cpuinfo")).await {
            if let Some(found) = cpuinfo_marker(&cpuinfo) {
                verdict.set(found, "guest");
            }
        }

        // 4. Virtualization-appliance distribution forces host role.
        if merged.get_str("distribution") == Some("VMwareESX") {
            verdict.set("VMware", "host");
        }

        // 5. IDE device model strings.
        if let Some(found) = self.ide_model_marker().await {
            verdict.set(found.0, found.1);
        }

        let mut facts = FactMap::new();
        if let (Some(vtype), Some(role)) = (verdict.vtype, verdict.role) {
            facts.insert("virtualization_type".to_string(), json!(vtype));
            facts.insert("virtualization_role".to_string(), json!(role));
        }
        Ok(facts)
    }
}

impl LinuxVirtual {
    /// Scan /proc/ide/hd*/model for virtual-disk vendor strings.
    async fn ide_model_marker(&self) -> Option<(&'static str, &'static str)> {
        let ide = rooted(&self.root, "/proc/ide");
        let mut entries = tokio::fs::read_dir(&ide).await.ok()?;
        let mut found = None;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with("hd") {
                continue;
            }
            if let Some(model) = probe::read_file(entry.path().join("model")).await {
                if model.contains("QEMU HARDDISK") {
                    found = Some(("kvm", "guest"));
                } else if model.contains("VMware Virtual") {
                    found = Some(("VMware", "guest"));
                }
            }
        }

        found
    }
}

fn cpuinfo_marker(cpuinfo: &str) -> Option<&'static str> {
    let mut found = None;
    for line in cpuinfo.lines() {
        let (key, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };
        match key.trim() {
            "model name" if value.contains("QEMU Virtual CPU") => found = Some("kvm"),
            "model name" if value.contains("UML") => found = Some("uml"),
            "vendor_id" if value.contains("User Mode Linux") => found = Some("uml"),
            "vendor_id" if value.contains("PowerVM Lx86") => found = Some("powervm_lx86"),
            "vendor_id" if value.contains("IBM/S390") => found = Some("ibm_systemz"),
            _ => {}
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &TempDir, path: &str, content: &str) {
        let full = root.path().join(path.trim_start_matches('/'));
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    async fn collect(root: &TempDir, merged: &FactSet) -> FactMap {
        LinuxVirtual::with_root(root.path())
            .collect(merged)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn no_evidence_yields_no_facts() {
        let root = TempDir::new().unwrap();
        let facts = collect(&root, &FactSet::new()).await;
        assert!(facts.is_empty());
    }

    #[tokio::test]
    async fn xen_guest_and_host() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("proc/xen")).unwrap();
        let facts = collect(&root, &FactSet::new()).await;
        assert_eq!(facts["virtualization_type"], json!("xen"));
        assert_eq!(facts["virtualization_role"], json!("guest"));

        write(&root, "/proc/xen/capabilities", "control_d");
        let facts = collect(&root, &FactSet::new()).await;
        assert_eq!(facts["virtualization_role"], json!("host"));
    }

    #[tokio::test]
    async fn kvm_module_implies_host() {
        let root = TempDir::new().unwrap();
        write(&root, "/proc/modules", "kvm 303104 1 kvm_intel\next4 1 0\n");
        let facts = collect(&root, &FactSet::new()).await;
        assert_eq!(facts["virtualization_type"], json!("kvm"));
        assert_eq!(facts["virtualization_role"], json!("host"));
    }

    #[tokio::test]
    async fn vbox_guest_module() {
        let root = TempDir::new().unwrap();
        write(&root, "/proc/modules", "vboxguest 1 0\n");
        let facts = collect(&root, &FactSet::new()).await;
        assert_eq!(facts["virtualization_type"], json!("virtualbox"));
        assert_eq!(facts["virtualization_role"], json!("guest"));
    }

    #[tokio::test]
    async fn later_module_line_overrides_earlier() {
        let root = TempDir::new().unwrap();
        write(
            &root,
            "/proc/modules",
            "kvm 303104 1 kvm_intel\nvboxguest 1 0\n",
        );
        let facts = collect(&root, &FactSet::new()).await;
        assert_eq!(facts["virtualization_type"], json!("virtualbox"));
        assert_eq!(facts["virtualization_role"], json!("guest"));
    }

    #[tokio::test]
    async fn cpuinfo_marker_after_module_check_wins() {
        // Both a kvm module and a QEMU cpuinfo marker: the cpuinfo check runs
        // after the module check, so the final verdict is kvm/guest.
        let root = TempDir::new().unwrap();
        write(&root, "/proc/modules", "kvm 303104 1 kvm_intel\n");
        write(
            &root,
            "/proc/cpuinfo",
            "model name\t: QEMU Virtual CPU version 1.0\n",
        );
        let facts = collect(&root, &FactSet::new()).await;
        assert_eq!(facts["virtualization_type"], json!("kvm"));
        assert_eq!(facts["virtualization_role"], json!("guest"));
    }

    #[tokio::test]
    async fn esx_distribution_forces_host_role() {
        let root = TempDir::new().unwrap();
        write(
            &root,
            "/proc/cpuinfo",
            "model name\t: QEMU Virtual CPU version 1.0\n",
        );
        let mut merged = FactSet::new();
        merged.insert("distribution", json!("VMwareESX"));
        let facts = collect(&root, &merged).await;
        assert_eq!(facts["virtualization_type"], json!("VMware"));
        assert_eq!(facts["virtualization_role"], json!("host"));
    }

    #[tokio::test]
    async fn ide_model_check_is_last() {
        let root = TempDir::new().unwrap();
        write(&root, "/proc/modules", "kvm 303104 1 kvm_intel\n");
        write(&root, "/proc/ide/hda/model", "VMware Virtual IDE Hard Drive\n");
        let facts = collect(&root, &FactSet::new()).await;
        assert_eq!(facts["virtualization_type"], json!("VMware"));
        assert_eq!(facts["virtualization_role"], json!("guest"));
    }
}
