//! Environment variable fallbacks.
//!
//! Environment variables are fallbacks, not overrides: they only apply to
//! fields that no config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "ROLLCALL_MINIMUM_AGE",
        field_path: "registration.minimum_age",
    },
    EnvMapping {
        var_name: "ROLLCALL_AUDIT_CAPTURE",
        field_path: "audit.capture_enabled",
    },
    EnvMapping {
        var_name: "ROLLCALL_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "ROLLCALL_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Apply environment variable fallbacks to fields no config file set.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources
            .get(mapping.field_path)
            .is_some_and(|layer| layer.is_file())
        {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_field_from_string(merged, mapping.field_path, val);
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set a dotted `path` in the tree, creating intermediate tables.
fn set_field_from_string(root: &mut toml::Value, path: &str, val: &str) {
    let toml_val = coerce_to_toml_value(path, val);
    let Some((parents, leaf)) = path.rsplit_once('.') else {
        if let Some(table) = root.as_table_mut() {
            table.insert(path.to_owned(), toml_val);
        }
        return;
    };

    let mut current = root;
    for segment in parents.split('.') {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), toml_val);
    }
}

/// Coerce a string env var value to the field's TOML type. Values that do
/// not parse stay strings and fail deserialization later.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if path == "registration.minimum_age"
        && let Ok(i) = val.trim().parse::<i64>()
    {
        return toml::Value::Integer(i);
    }

    if path == "audit.capture_enabled"
        && let Some(b) = parse_bool(val)
    {
        return toml::Value::Boolean(b);
    }

    toml::Value::String(val.to_owned())
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn defaults() -> (toml::Value, FieldSources) {
        let val: toml::Value = toml::from_str(
            r#"
            [registration]
            minimum_age = 13
            [logging]
            level = "info"
        "#,
        )
        .unwrap();
        let mut sources = FieldSources::new();
        crate::merge::record_leaves(&val, "", ConfigLayer::Defaults, &mut sources);
        (val, sources)
    }

    #[test]
    fn env_replaces_defaults() {
        let (mut val, mut sources) = defaults();
        let env = make_env(&[("ROLLCALL_MINIMUM_AGE", "18"), ("ROLLCALL_AUDIT_CAPTURE", "off")]);
        assert_eq!(apply_env_fallbacks(&mut val, &mut sources, &env), 2);
        assert_eq!(val["registration"]["minimum_age"].as_integer(), Some(18));
        assert_eq!(val["audit"]["capture_enabled"].as_bool(), Some(false));
        assert_eq!(
            sources.get("registration.minimum_age"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn env_does_not_override_files() {
        let (mut val, mut sources) = defaults();
        sources.insert("logging.level".to_owned(), ConfigLayer::User);
        let env = make_env(&[("ROLLCALL_LOG_LEVEL", "trace")]);
        assert_eq!(apply_env_fallbacks(&mut val, &mut sources, &env), 0);
        assert_eq!(val["logging"]["level"].as_str(), Some("info"));
    }

    #[test]
    fn unparseable_numbers_stay_strings() {
        assert_eq!(
            coerce_to_toml_value("registration.minimum_age", "thirteen"),
            toml::Value::String("thirteen".to_owned())
        );
    }
}
