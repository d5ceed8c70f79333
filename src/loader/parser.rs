//! YAML parser for connector definitions
//!
//! Parses and validates connector YAML files.
//! Supports both built-in connectors (by name) and custom YAML files (by path).

use crate::connectors;
use crate::error::{Error, Result};
use crate::loader::types::{ConnectorDefinition, StreamDefinition};
use crate::slice::SliceConfig;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load a connector definition from a name or file path
///
/// This function first checks if the input is a built-in connector name (e.g., "robin"),
/// then falls back to loading from a file path.
///
/// # Examples
///
/// ```ignore
/// // Load built-in connector by name
/// let connector = load_connector("robin")?;
///
/// // Load custom connector from file
/// let connector = load_connector("./my-connector.yaml")?;
/// ```
pub fn load_connector(path: impl AsRef<Path>) -> Result<ConnectorDefinition> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    // A bare name without separators or a YAML extension may be built in
    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(def) = connectors::load_builtin(&path_str) {
            let def = def?;
            validate_connector(&def)?;
            return Ok(def);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            let builtin_list = connectors::list_builtin().join(", ");
            Error::config(format!(
                "Connector '{}' not found. Built-in connectors: {}. Or provide a path to a YAML file.",
                path.display(),
                builtin_list
            ))
        } else {
            Error::config(format!(
                "Failed to read connector file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_connector_from_str(&content)
}

/// Load a connector definition from a YAML string
pub fn load_connector_from_str(yaml: &str) -> Result<ConnectorDefinition> {
    let def: ConnectorDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse connector YAML: {e}")))?;

    validate_connector(&def)?;
    Ok(def)
}

/// Validate a connector definition.
///
/// Streams are checked in declaration order, so a parent must be declared
/// before any stream sliced over it. That ordering also rules out cycles.
pub fn validate_connector(def: &ConnectorDefinition) -> Result<()> {
    if def.name.trim().is_empty() {
        return Err(Error::config("Connector name cannot be empty"));
    }

    if def.base_url.trim().is_empty() {
        return Err(Error::config("Connector base_url cannot be empty"));
    }

    if def.streams.is_empty() {
        return Err(Error::config("Connector must have at least one stream"));
    }

    let mut declared: HashSet<&str> = HashSet::new();
    for stream in &def.streams {
        validate_stream(stream)?;

        if let Some(parent) = stream.parent() {
            if parent == stream.name {
                return Err(Error::config(format!(
                    "Stream '{}' cannot be sliced over itself",
                    stream.name
                )));
            }
            if !declared.contains(parent) {
                let reason = if def.stream(parent).is_some() {
                    "must be declared before it"
                } else {
                    "does not exist"
                };
                return Err(Error::config(format!(
                    "Parent stream '{parent}' of '{}' {reason}",
                    stream.name
                )));
            }
        }

        if !declared.insert(stream.name.as_str()) {
            return Err(Error::config(format!(
                "Duplicate stream name: {}",
                stream.name
            )));
        }
    }

    if let Some(check) = &def.check {
        if let Some(name) = &check.stream {
            if def.stream(name).is_none() {
                return Err(Error::config(format!(
                    "Check stream '{name}' does not exist"
                )));
            }
        }
    }

    Ok(())
}

/// Validate a stream definition
fn validate_stream(stream: &StreamDefinition) -> Result<()> {
    if stream.name.trim().is_empty() {
        return Err(Error::config("Stream name cannot be empty"));
    }

    if stream.request.path.trim().is_empty() {
        return Err(Error::config(format!(
            "Stream '{}' path cannot be empty",
            stream.name
        )));
    }

    if let Some(&status) = stream
        .suppress_http_errors
        .iter()
        .find(|s| !(400..600).contains(*s))
    {
        return Err(Error::config(format!(
            "Stream '{}' can only suppress error statuses, got {status}",
            stream.name
        )));
    }

    match &stream.slicing {
        Some(SliceConfig::Parent { fields, .. }) if fields.is_empty() => {
            return Err(Error::config(format!(
                "Stream '{}' is sliced over a parent but projects no fields",
                stream.name
            )));
        }
        Some(SliceConfig::List { values, .. }) if values.is_empty() => {
            return Err(Error::config(format!(
                "Stream '{}' has an empty slice list",
                stream.name
            )));
        }
        _ => {}
    }

    for key in stream.request.slice_params.values() {
        if stream.slicing.is_none() {
            return Err(Error::config(format!(
                "Stream '{}' reads slice key '{key}' but is not sliced",
                stream.name
            )));
        }
    }

    Ok(())
}
