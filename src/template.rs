//! Template interpolation for connector definitions
//!
//! Handles `{{ variable }}` interpolation in paths, params, headers and auth
//! settings. Variables live under four roots:
//!
//! - `config.*`: the user's connector configuration
//! - `slice.*`: values of the slice being read (parent ids and the like)
//! - `state.*`: the stream's checkpoint
//! - `now.*`: run-time values (`now.iso`, `now.epoch`)
//!
//! A bare name such as `{{ api_key }}` is looked up in the config.

use crate::error::{Error, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template regex is valid")
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub config: Value,
    pub slice: Value,
    pub state: Value,
    pub now: Value,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with config values
    pub fn with_config(config: Value) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn slice(mut self, slice: Value) -> Self {
        self.slice = slice;
        self
    }

    #[must_use]
    pub fn state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Populate `now.iso` and `now.epoch` from the current clock
    #[must_use]
    pub fn with_clock(mut self) -> Self {
        let now = chrono::Utc::now();
        self.now = serde_json::json!({
            "iso": now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "epoch": now.timestamp(),
        });
        self
    }

    /// Get a value by path (e.g., "config.api_key")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        let (root, rest) = match parts[0] {
            "config" => (&self.config, &parts[1..]),
            "slice" => (&self.slice, &parts[1..]),
            "state" => (&self.state, &parts[1..]),
            "now" => (&self.now, &parts[1..]),
            _ => (&self.config, &parts[..]),
        };
        lookup(root, rest)
    }
}

/// Walk a dotted path through nested objects
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, part| match current {
        Value::Object(map) => map.get(*part),
        _ => None,
    })
}

/// Walk a dot-separated path such as `paging.has_next_page`
pub fn lookup_dotted<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    let parts: Vec<&str> = path.split('.').collect();
    lookup(value, &parts)
}

/// Render a template string with the given context.
///
/// Every undefined variable is reported in a single error.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    render_with(template, ctx, |_, raw| raw)
}

/// Render a URL path template.
///
/// `slice.*` and `state.*` values come from fetched records, so they are
/// percent-encoded as a single path segment. Config values are inserted
/// verbatim and may carry `/` on purpose.
pub fn render_path(template: &str, ctx: &TemplateContext) -> Result<String> {
    render_with(template, ctx, |var_path, raw| {
        if var_path.starts_with("slice.") || var_path.starts_with("state.") {
            encode_segment(&raw)
        } else {
            raw
        }
    })
}

fn render_with<F>(template: &str, ctx: &TemplateContext, escape: F) -> Result<String>
where
    F: Fn(&str, String) -> String,
{
    let mut missing = Vec::new();
    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &Captures<'_>| {
        let var_path = &cap[1];
        match ctx.get(var_path) {
            // A null is as good as absent for interpolation purposes
            Some(value) if !value.is_null() => escape(var_path, value_to_string(value)),
            _ => {
                missing.push(var_path.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Percent-encode a value for use as one path segment
fn encode_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Convert a JSON value to a string for template substitution
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Render all string values in a JSON value.
///
/// A string that is exactly one template (`"{{ slice.id }}"`) keeps the
/// type of the value it resolves to, so numbers stay numbers.
pub fn render_value(value: &Value, ctx: &TemplateContext) -> Result<Value> {
    match value {
        Value::String(s) if has_templates(s) => {
            if let Some(cap) = TEMPLATE_REGEX.captures(s) {
                if cap[0].len() == s.len() {
                    return match ctx.get(&cap[1]) {
                        Some(v) if !v.is_null() => Ok(v.clone()),
                        _ => Err(Error::undefined_var(&cap[1])),
                    };
                }
            }
            Ok(Value::String(render(s, ctx)?))
        }
        Value::Object(map) => {
            let mut new_map = serde_json::Map::new();
            for (k, v) in map {
                new_map.insert(k.clone(), render_value(v, ctx)?);
            }
            Ok(Value::Object(new_map))
        }
        Value::Array(arr) => arr
            .iter()
            .map(|v| render_value(v, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        _ => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_substitution() {
        let ctx = TemplateContext::with_config(json!({
            "api_key": "sk_test_123"
        }));

        let result = render("Bearer {{ config.api_key }}", &ctx).unwrap();
        assert_eq!(result, "Bearer sk_test_123");
    }

    #[test]
    fn test_bare_name_reads_config() {
        let ctx = TemplateContext::with_config(json!({"organization_id": "org-1"}));
        assert_eq!(
            render("/organizations/{{ organization_id }}", &ctx).unwrap(),
            "/organizations/org-1"
        );
    }

    #[test]
    fn test_slice_context() {
        let ctx = TemplateContext::with_config(json!({"base": "https://api.example.com"}))
            .slice(json!({"location_id": 12345}));

        let result = render("{{ config.base }}/locations/{{ slice.location_id }}", &ctx).unwrap();
        assert_eq!(result, "https://api.example.com/locations/12345");
    }

    #[test]
    fn test_undefined_variables_reported_together() {
        let ctx = TemplateContext::new();
        let err = render("{{ config.missing }}/{{ slice.id }}", &ctx).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("config.missing"));
        assert!(message.contains("slice.id"));
    }

    #[test]
    fn test_null_is_undefined() {
        let ctx = TemplateContext::with_config(json!({"token": null}));
        assert!(render("{{ config.token }}", &ctx).is_err());
    }

    #[test]
    fn test_has_templates() {
        assert!(has_templates("{{ config.key }}"));
        assert!(has_templates("prefix {{ var }} suffix"));
        assert!(!has_templates("no templates here"));
        assert!(!has_templates("{ not a template }"));
    }

    #[test]
    fn test_render_value_keeps_types() {
        let ctx = TemplateContext::with_config(json!({"limit": 100, "key": "abc"}))
            .slice(json!({"ids": [1, 2]}));

        let input = json!({
            "limit": "{{ config.limit }}",
            "ids": "{{ slice.ids }}",
            "label": "key={{ config.key }}"
        });

        let result = render_value(&input, &ctx).unwrap();
        assert_eq!(
            result,
            json!({"limit": 100, "ids": [1, 2], "label": "key=abc"})
        );
    }

    #[test]
    fn test_whitespace_in_template() {
        let ctx = TemplateContext::with_config(json!({"key": "value"}));

        assert_eq!(render("{{config.key}}", &ctx).unwrap(), "value");
        assert_eq!(render("{{  config.key  }}", &ctx).unwrap(), "value");
    }

    #[test]
    fn test_render_path_encodes_record_values() {
        let ctx = TemplateContext::with_config(json!({"account": "acct/1"}))
            .slice(json!({"group": "Team #2/ops", "id": 7}));

        assert_eq!(
            render_path("/{{ config.account }}/groups/{{ slice.group }}/{{ slice.id }}", &ctx)
                .unwrap(),
            "/acct/1/groups/Team%20%232%2Fops/7"
        );
        assert_eq!(
            render("/groups/{{ slice.group }}", &ctx).unwrap(),
            "/groups/Team #2/ops"
        );
    }

    #[test]
    fn test_render_path_reports_missing() {
        let ctx = TemplateContext::new();
        assert!(render_path("/groups/{{ slice.group }}", &ctx).is_err());
    }

    #[test]
    fn test_clock_values() {
        let ctx = TemplateContext::new().with_clock();
        let epoch: i64 = render("{{ now.epoch }}", &ctx).unwrap().parse().unwrap();
        assert!(epoch > 1_600_000_000);
    }

    #[test]
    fn test_lookup_dotted() {
        let body = json!({"paging": {"has_next_page": true}});
        assert_eq!(lookup_dotted(&body, "paging.has_next_page"), Some(&json!(true)));
        assert_eq!(lookup_dotted(&body, "paging.page"), None);
        assert_eq!(lookup_dotted(&body, ""), Some(&body));
    }
}
