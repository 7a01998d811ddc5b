//! Platform selection
//!
//! Concrete collector implementations are chosen at runtime from the detected
//! OS name, not at compile time: the tool may be asked to describe fixture
//! trees for other platforms, and tests exercise every branch everywhere.
//! An unrecognized OS degrades to Generic implementations that contribute no
//! facts rather than erroring.

use std::path::{Path, PathBuf};

use super::hardware::{GenericHardware, HardwareFacts, LinuxHardware, SunOsHardware};
use super::network::{GenericNetwork, LinuxNetwork, NetworkFacts};
use super::probe;
use super::virt::{GenericVirtual, LinuxVirtual, VirtualFacts};

/// Recognized platform identifiers, derived from `uname -s`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OsTag {
    Linux,
    SunOs,
    Other(String),
}

impl OsTag {
    pub fn from_system(system: &str) -> Self {
        match system {
            "Linux" => OsTag::Linux,
            "SunOS" => OsTag::SunOs,
            other => OsTag::Other(other.to_string()),
        }
    }

    /// Detect the running platform. Hosts without `uname` resolve to Other
    /// and collect base facts only.
    pub async fn detect() -> Self {
        let out = probe::run_command(&["uname", "-s"]).await;
        if out.success() {
            Self::from_system(out.stdout.trim())
        } else {
            OsTag::Other(String::new())
        }
    }
}

/// The per-category implementations resolved for one collection run.
pub struct CollectorSet {
    pub hardware: Box<dyn HardwareFacts>,
    pub network: Box<dyn NetworkFacts>,
    pub virtual_: Box<dyn VirtualFacts>,
}

/// Resolve one implementation per capability category for the given OS.
///
/// Selection happens once per run and never fails; categories without a
/// platform-specific implementation fall back to Generic.
pub fn collectors_for(os: &OsTag, root: impl AsRef<Path>) -> CollectorSet {
    let root: PathBuf = root.as_ref().to_path_buf();
    match os {
        OsTag::Linux => CollectorSet {
            hardware: Box::new(LinuxHardware::with_root(&root)),
            network: Box::new(LinuxNetwork::with_root(&root)),
            virtual_: Box::new(LinuxVirtual::with_root(&root)),
        },
        OsTag::SunOs => CollectorSet {
            hardware: Box::new(SunOsHardware::new()),
            network: Box::new(GenericNetwork),
            virtual_: Box::new(GenericVirtual),
        },
        OsTag::Other(_) => CollectorSet {
            hardware: Box::new(GenericHardware),
            network: Box::new(GenericNetwork),
            virtual_: Box::new(GenericVirtual),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_selects_linux_collectors() {
        let set = collectors_for(&OsTag::Linux, "/");
        assert_eq!(set.hardware.platform(), "Linux");
        assert_eq!(set.network.platform(), "Linux");
        assert_eq!(set.virtual_.platform(), "Linux");
    }

    #[test]
    fn sunos_selects_hardware_only() {
        let set = collectors_for(&OsTag::SunOs, "/");
        assert_eq!(set.hardware.platform(), "SunOS");
        assert_eq!(set.network.platform(), "Generic");
        assert_eq!(set.virtual_.platform(), "Generic");
    }

    #[test]
    fn unknown_os_degrades_to_generic() {
        let set = collectors_for(&OsTag::from_system("Haiku"), "/");
        assert_eq!(set.hardware.platform(), "Generic");
        assert_eq!(set.network.platform(), "Generic");
        assert_eq!(set.virtual_.platform(), "Generic");
    }

    #[test]
    fn generic_collectors_contribute_no_facts() {
        let set = collectors_for(&OsTag::from_system("Haiku"), "/");
        tokio_test::block_on(async {
            assert!(set.hardware.collect().await.unwrap().is_empty());
            assert!(set.network.collect().await.unwrap().is_empty());
            let facts = crate::facts::FactSet::new();
            assert!(set.virtual_.collect(&facts).await.unwrap().is_empty());
        });
    }

    #[test]
    fn os_tag_parsing() {
        assert_eq!(OsTag::from_system("Linux"), OsTag::Linux);
        assert_eq!(OsTag::from_system("SunOS"), OsTag::SunOs);
        assert_eq!(
            OsTag::from_system("Darwin"),
            OsTag::Other("Darwin".to_string())
        );
    }
}
