//! Invocation envelope
//!
//! The tool is called with a single argument file holding either a JSON
//! object or shell-style `key=value` tokens. Options from that file are
//! echoed back in the output document together with every collected fact
//! under an `ansible_` prefix and any external-provider keys.

use serde_json::{json, Map, Value};
use std::path::Path;

use crate::facts::external::{self, default_providers};
use crate::facts::{FactCollector, FactMap, FactSet};

#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    #[error("incorrect number of arguments")]
    MissingArgumentFile,

    #[error("argument file not found: {0}")]
    ArgumentFileNotFound(String),

    #[error("unable to read argument file: {0}")]
    ArgumentFileRead(#[from] std::io::Error),

    #[error("unable to parse argument file: {0}")]
    ArgumentParse(String),
}

/// Parse argument-file content: a JSON object, or failing that shell-style
/// `key=value` tokens.
pub fn parse_options(content: &str) -> Result<Map<String, Value>, SetupError> {
    if let Ok(Value::Object(options)) = serde_json::from_str(content) {
        return Ok(options);
    }

    let tokens =
        shell_words::split(content).map_err(|e| SetupError::ArgumentParse(e.to_string()))?;

    let mut options = Map::new();
    for token in tokens {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| SetupError::ArgumentParse(format!("expected key=value, got {token}")))?;
        options.insert(key.to_string(), json!(value));
    }
    Ok(options)
}

/// Assemble the output document: options, `ansible_`-prefixed facts,
/// provider-prefixed keys, and the verbose-suppression flag.
pub fn assemble_result(options: Map<String, Value>, facts: FactSet, external: FactMap) -> Value {
    let mut result = options;
    for (key, value) in facts {
        result.insert(format!("ansible_{key}"), value);
    }
    for (key, value) in external {
        result.insert(key, value);
    }
    result.insert("verbose_override".to_string(), json!(true));
    Value::Object(result)
}

pub fn failure_document(msg: &str) -> Value {
    json!({ "failed": true, "msg": msg })
}

/// Full run for the live host: parse the argument file, collect facts, merge
/// external providers, return the output document.
pub async fn run(argument_file: Option<&Path>) -> Result<Value, SetupError> {
    let path = argument_file.ok_or(SetupError::MissingArgumentFile)?;
    if !path.exists() {
        return Err(SetupError::ArgumentFileNotFound(
            path.display().to_string(),
        ));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let options = parse_options(&content)?;

    let collector = FactCollector::for_host().await;
    let facts = collector.collect().await;
    let external = external::collect_external(&default_providers()).await;

    Ok(assemble_result(options, facts, external))
}
