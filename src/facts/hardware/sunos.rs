//! Solaris hardware facts from kstat/prtconf/swap

use serde_json::json;

use super::HardwareFacts;
use crate::facts::probe;
use crate::facts::{FactError, FactMap};
use async_trait::async_trait;

pub struct SunOsHardware;

impl Default for SunOsHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SunOsHardware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HardwareFacts for SunOsHardware {
    fn platform(&self) -> &'static str {
        "SunOS"
    }

    async fn collect(&self) -> Result<FactMap, FactError> {
        let mut facts = FactMap::new();

        let kstat = probe::run_command(&["/usr/bin/kstat", "cpu_info"]).await;
        if kstat.success() {
            facts.extend(parse_kstat_cpu_info(&kstat.stdout));
        }

        let prtconf = probe::run_command(&["/usr/sbin/prtconf"]).await;
        if prtconf.success() {
            facts.extend(parse_prtconf_memory(&prtconf.stdout));
        }

        let swap = probe::run_command(&["/usr/sbin/swap", "-s"]).await;
        if swap.success() {
            facts.extend(parse_swap_summary(&swap.stdout));
        }

        Ok(facts)
    }
}

/// One `brand` line per logical CPU. Solaris exposes no per-socket core
/// counts through kstat, so processor_cores degrades to "NA".
fn parse_kstat_cpu_info(out: &str) -> FactMap {
    let mut facts = FactMap::new();
    let mut processors: Vec<String> = Vec::new();

    for line in out.lines() {
        let mut tokens = line.split_whitespace();
        if tokens.next() == Some("brand") {
            let brand = tokens.collect::<Vec<_>>().join(" ");
            if !brand.is_empty() {
                processors.push(brand);
            }
        }
    }

    facts.insert("processor_count".to_string(), json!(processors.len()));
    facts.insert("processor".to_string(), json!(processors));
    facts.insert("processor_cores".to_string(), json!("NA"));
    facts
}

fn parse_prtconf_memory(out: &str) -> FactMap {
    let mut facts = FactMap::new();

    for line in out.lines() {
        if line.contains("Memory size") {
            if let Some(mb) = line
                .split_whitespace()
                .nth(2)
                .and_then(|s| s.parse::<u64>().ok())
            {
                facts.insert("memtotal_mb".to_string(), json!(mb));
            }
        }
    }

    facts
}

/// `swap -s` prints one summary line of kilobyte counters with a trailing
/// `k`, e.g. `total: 111856k bytes allocated + 27512k reserved = 139368k
/// used, 1817744k available`.
fn parse_swap_summary(out: &str) -> FactMap {
    let mut facts = FactMap::new();
    let tokens: Vec<&str> = out.split_whitespace().collect();

    let kb_at = |idx: usize| -> Option<u64> {
        tokens
            .get(idx)?
            .trim_end_matches('k')
            .parse::<u64>()
            .ok()
    };

    if let (Some(used), Some(free)) = (kb_at(8), kb_at(10)) {
        facts.insert("swapfree_mb".to_string(), json!(free / 1024));
        facts.insert("swaptotal_mb".to_string(), json!((free + used) / 1024));
    }

    facts
}
