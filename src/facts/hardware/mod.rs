//! Hardware fact collection

pub mod linux;
pub mod sunos;

use async_trait::async_trait;

use super::{FactError, FactMap};

pub use linux::LinuxHardware;
pub use sunos::SunOsHardware;

/// Memory/swap totals, CPU inventory and platform-specific extras (DMI on
/// Linux). One implementation per supported OS plus a Generic fallback.
#[async_trait]
pub trait HardwareFacts: Send + Sync {
    /// OS tag this implementation matches, used by the selector tests.
    fn platform(&self) -> &'static str;

    async fn collect(&self) -> Result<FactMap, FactError>;
}

pub struct GenericHardware;

#[async_trait]
impl HardwareFacts for GenericHardware {
    fn platform(&self) -> &'static str {
        "Generic"
    }

    async fn collect(&self) -> Result<FactMap, FactError> {
        Ok(FactMap::new())
    }
}
