//! Built-in connector definitions embedded in the binary
//!
//! YAML connectors are compiled in with `include_str!`, so users can pass
//! `--connector robin` instead of a file path. QuickSight has too many
//! near-identical operations to keep in YAML and is generated from a table.

pub mod quicksight;

use crate::error::{Error, Result};
use crate::loader::ConnectorDefinition;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in connector YAML definitions
pub static BUILTIN_CONNECTORS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        // Workplace
        m.insert("robin", include_str!("../../connectors/robin.yaml"));

        // Endpoint management & security
        m.insert(
            "desktop-central",
            include_str!("../../connectors/desktop-central.yaml"),
        );
        m.insert(
            "crowdstrike",
            include_str!("../../connectors/crowdstrike.yaml"),
        );

        // Asset management
        m.insert("snipeit", include_str!("../../connectors/snipeit.yaml"));

        // Recruiting
        m.insert(
            "zoho-recruit",
            include_str!("../../connectors/zoho-recruit.yaml"),
        );

        m
    });

/// Get a built-in connector's YAML by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_CONNECTORS.get(name).copied()
}

/// Check if a connector name is a built-in connector
pub fn is_builtin(name: &str) -> bool {
    name == quicksight::NAME || BUILTIN_CONNECTORS.contains_key(name)
}

/// List all built-in connector names
pub fn list_builtin() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BUILTIN_CONNECTORS.keys().copied().collect();
    names.push(quicksight::NAME);
    names.sort_unstable();
    names
}

/// Parse a built-in connector.
///
/// Returns `None` when no built-in has this name. Validation is left to the
/// caller, the same as for file-based definitions.
pub fn load_builtin(name: &str) -> Option<Result<ConnectorDefinition>> {
    if name == quicksight::NAME {
        return Some(Ok(quicksight::definition()));
    }

    let yaml = get_builtin(name)?;
    Some(serde_yaml::from_str(yaml).map_err(|e| {
        Error::config(format!("Built-in connector '{name}' is malformed: {e}"))
    }))
}

/// Connector metadata for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorInfo {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub streams: usize,
}

/// Summaries of every built-in connector that parses
pub fn list_builtin_info() -> Vec<ConnectorInfo> {
    list_builtin()
        .into_iter()
        .filter_map(|name| load_builtin(name)?.ok())
        .map(|def| ConnectorInfo {
            streams: def.streams.len(),
            name: def.name,
            title: def.title,
            description: def.description,
        })
        .collect()
}

#[cfg(test)]
mod tests;
