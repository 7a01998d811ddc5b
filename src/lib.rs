//! Rustle Facts - host fact gathering for rustle execution plans
//!
//! This crate discovers a canonical set of host attributes (platform identity,
//! CPU/memory/swap, network interfaces, virtualization role) by probing
//! OS-specific data sources, and merges optional facter/ohai output into a
//! single flat fact set.

pub mod facts;
pub mod setup;

pub use facts::collector::FactCollector;
pub use facts::{FactError, FactMap, FactSet};
