//! Virtualization fact collection

pub mod linux;

use async_trait::async_trait;

use super::{FactError, FactMap, FactSet};

pub use linux::LinuxVirtual;

/// `virtualization_type` / `virtualization_role` detection.
///
/// Receives a read-only view of the facts merged so far: the appliance-OS
/// check depends on the base distribution fact.
#[async_trait]
pub trait VirtualFacts: Send + Sync {
    fn platform(&self) -> &'static str;

    async fn collect(&self, merged: &FactSet) -> Result<FactMap, FactError>;
}

pub struct GenericVirtual;

#[async_trait]
impl VirtualFacts for GenericVirtual {
    fn platform(&self) -> &'static str {
        "Generic"
    }

    async fn collect(&self, _merged: &FactSet) -> Result<FactMap, FactError> {
        Ok(FactMap::new())
    }
}
