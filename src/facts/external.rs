//! External fact providers
//!
//! facter and ohai are opaque third-party tools: if the binary is present at
//! its well-known path it is invoked and its stdout parsed as JSON. Any
//! failure along the way (missing binary, nonzero exit, unparseable output)
//! collapses to `None` and the provider contributes zero keys.

use serde_json::Value;
use tracing::debug;

use super::probe;
use super::FactMap;

pub struct ExternalProvider {
    name: &'static str,
    bin: String,
    args: &'static [&'static str],
    strings_only: bool,
}

/// The two supported providers at their fixed install paths.
pub fn default_providers() -> Vec<ExternalProvider> {
    vec![
        ExternalProvider::new("facter", "/usr/bin/facter", &["--json"], false),
        // No key-flattening policy is defined for ohai's nested values, so
        // only string-valued top-level entries are merged.
        ExternalProvider::new("ohai", "/usr/bin/ohai", &[], true),
    ]
}

impl ExternalProvider {
    pub fn new(
        name: &'static str,
        bin: impl Into<String>,
        args: &'static [&'static str],
        strings_only: bool,
    ) -> Self {
        Self {
            name,
            bin: bin.into(),
            args,
            strings_only,
        }
    }

    /// Invoke the provider and parse its output; absence or parse failure is
    /// an explicit `None`, never an error.
    pub async fn collect(&self) -> Option<FactMap> {
        if !probe::path_exists(&self.bin).await {
            return None;
        }

        let mut argv: Vec<&str> = vec![&self.bin];
        argv.extend_from_slice(self.args);
        let out = probe::run_command(&argv).await;
        if !out.success() {
            debug!(provider = self.name, rc = out.rc, "provider exited nonzero, skipping");
            return None;
        }

        parse_provider_output(self.name, &out.stdout, self.strings_only)
    }
}

/// Parse provider stdout as a JSON object and prefix every qualifying
/// top-level key with the provider name.
pub fn parse_provider_output(name: &str, stdout: &str, strings_only: bool) -> Option<FactMap> {
    let parsed: Value = serde_json::from_str(stdout).ok()?;
    let object = parsed.as_object()?;

    let mut facts = FactMap::new();
    for (key, value) in object {
        if strings_only && !value.is_string() {
            continue;
        }
        facts.insert(format!("{name}_{key}"), value.clone());
    }
    Some(facts)
}

/// Run every provider, merging whatever each one yields.
pub async fn collect_external(providers: &[ExternalProvider]) -> FactMap {
    let mut facts = FactMap::new();
    for provider in providers {
        if let Some(partial) = provider.collect().await {
            facts.extend(partial);
        }
    }
    facts
}
