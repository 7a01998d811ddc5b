//! Host fact collection framework

pub mod base;
pub mod collector;
pub mod external;
pub mod hardware;
pub mod network;
pub mod platform;
pub mod probe;
pub mod virt;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub use collector::FactCollector;

/// Partial result produced by a single collector.
pub type FactMap = HashMap<String, serde_json::Value>;

/// The aggregated flat key-value description of a host.
///
/// Built fresh on every run by unioning collector partials in a fixed order;
/// ordered internally so serialized output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactSet(BTreeMap<String, serde_json::Value>);

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union a collector's partial result into the set. Last write wins.
    pub fn merge(&mut self, partial: FactMap) {
        for (key, value) in partial {
            self.0.insert(key, value);
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, serde_json::Value> {
        self.0
    }
}

impl IntoIterator for FactSet {
    type Item = (String, serde_json::Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, serde_json::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// IPv4 assignment on one interface. The network address is always derived
/// from address and netmask, never taken verbatim from command output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceIpv4 {
    pub address: String,
    pub netmask: String,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceIpv6 {
    pub address: String,
    pub prefix: u8,
    pub scope: String,
}

#[derive(thiserror::Error, Debug)]
pub enum FactError {
    #[error("failed to parse {source_kind} output: {detail}")]
    Parse {
        source_kind: &'static str,
        detail: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
