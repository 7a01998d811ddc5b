//! Network fact collection

pub mod linux;

use async_trait::async_trait;

use super::{FactError, FactMap};

pub use linux::LinuxNetwork;

/// Interface enumeration and per-interface address facts.
#[async_trait]
pub trait NetworkFacts: Send + Sync {
    fn platform(&self) -> &'static str;

    async fn collect(&self) -> Result<FactMap, FactError>;
}

pub struct GenericNetwork;

#[async_trait]
impl NetworkFacts for GenericNetwork {
    fn platform(&self) -> &'static str {
        "Generic"
    }

    async fn collect(&self) -> Result<FactMap, FactError> {
        Ok(FactMap::new())
    }
}
