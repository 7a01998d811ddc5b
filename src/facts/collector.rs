//! Fact aggregation
//!
//! Runs the base collector plus the OS-selected hardware, network and
//! virtualization collectors in a fixed order and unions their partial
//! results into one FactSet. A failing collector contributes an empty
//! partial instead of aborting the pass.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::base::BaseFacts;
use super::platform::{collectors_for, CollectorSet, OsTag};
use super::{FactMap, FactSet};

pub struct FactCollector {
    os: OsTag,
    base: BaseFacts,
    collectors: CollectorSet,
}

impl FactCollector {
    /// Build a collector for the running host.
    pub async fn for_host() -> Self {
        let os = OsTag::detect().await;
        Self::new(os, "/")
    }

    /// Build a collector for an explicit OS tag and probe root. Tests use
    /// this to run the full pass against synthetic /proc and /sys trees.
    pub fn new(os: OsTag, root: impl AsRef<Path>) -> Self {
        let root: PathBuf = root.as_ref().to_path_buf();
        Self {
            base: BaseFacts::with_root(&root),
            collectors: collectors_for(&os, &root),
            os,
        }
    }

    pub fn os(&self) -> &OsTag {
        &self.os
    }

    /// Run the full collection pass. Order matters: the virtualization
    /// collector reads the base distribution fact from the merged set.
    pub async fn collect(&self) -> FactSet {
        let mut facts = FactSet::new();

        facts.merge(guard("base", self.base.collect().await));
        facts.merge(guard("hardware", self.collectors.hardware.collect().await));
        facts.merge(guard("network", self.collectors.network.collect().await));
        let virt = self.collectors.virtual_.collect(&facts).await;
        facts.merge(guard("virtual", virt));

        debug!(count = facts.len(), "fact collection complete");
        facts
    }
}

/// Collapse a collector failure to an empty partial so one broken probe
/// cannot abort the whole pass.
fn guard(category: &str, result: Result<FactMap, super::FactError>) -> FactMap {
    match result {
        Ok(partial) => partial,
        Err(e) => {
            warn!(category, error = %e, "collector failed, continuing without its facts");
            FactMap::new()
        }
    }
}
