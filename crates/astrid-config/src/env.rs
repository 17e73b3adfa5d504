//! Environment variable fallbacks and `${VAR}` interpolation.
//!
//! Two independent mechanisms live here:
//!
//! - [`apply_env_fallbacks`] fills fields still at their compiled-in default
//!   from `ASTRID_<SECTION>__<FIELD>`-style variables (double underscore
//!   separates path segments, so field names containing a single underscore
//!   still round-trip, e.g. `ASTRID_RUN__MAX_ITERATIONS` → `run.max_iterations`).
//! - [`resolve_env_references`] and [`resolve_env_references_restricted`]
//!   expand `${VAR}` placeholders inside string values, so a config file can
//!   say `model = "${ASTRID_MODEL_OVERRIDE}"` without committing a secret to
//!   disk. The restricted variant only expands `ASTRID_*`/`ANTHROPIC_*`
//!   variables, so a workspace config (least trusted layer) cannot
//!   exfiltrate arbitrary environment state.

use std::collections::HashMap;
use std::env;

use crate::merge::{ConfigLayer, FieldSources};

const ENV_PREFIX: &str = "ASTRID_";
const RESTRICTED_PREFIXES: [&str; 2] = ["ASTRID_", "ANTHROPIC_"];

/// Snapshot the current process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    env::vars().collect()
}

/// Fill fields still at their compiled-in default with values taken from
/// `ASTRID_*` environment variables. A field set by any config file layer
/// takes precedence over its environment fallback. Returns the number of
/// fields overridden.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String>,
) -> usize {
    let mut applied = 0;
    for (key, value) in env_vars {
        if key == "ASTRID_HOME" {
            continue;
        }
        let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path = rest.to_ascii_lowercase().replace("__", ".");
        if path.is_empty() || !path.contains('.') {
            continue;
        }

        let already_set = matches!(sources.get(&path), Some(layer) if *layer != ConfigLayer::Defaults);
        if already_set {
            continue;
        }

        let segments: Vec<&str> = path.split('.').collect();
        set_nested_creating(merged, &segments, scalar_value(value));
        sources.insert(path, ConfigLayer::Environment);
        applied += 1;
    }
    applied
}

/// Expand `${VAR}` placeholders in every string value using any variable in
/// `env_vars`.
pub fn resolve_env_references(merged: &mut toml::Value, env_vars: &HashMap<String, String>) {
    walk_strings_mut(merged, &|s| interpolate(s, env_vars, &|_| true));
}

/// Expand `${VAR}` placeholders, but only for `ASTRID_*`/`ANTHROPIC_*`
/// variable names. Unrecognized placeholders are left untouched rather than
/// expanded or blanked, so they remain visible in diagnostics.
pub fn resolve_env_references_restricted(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String>,
) {
    walk_strings_mut(merged, &|s| {
        interpolate(s, env_vars, &|name| {
            RESTRICTED_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
        })
    });
}

fn scalar_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(raw.to_owned())
}

/// Like the `merge::path` helpers, but creates missing intermediate tables
/// instead of warning and bailing; environment fallbacks may target a path
/// `defaults.toml` never populated (e.g. an optional field left unset).
fn set_nested_creating(val: &mut toml::Value, path: &[&str], new_val: toml::Value) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };

    if !val.is_table() {
        *val = toml::Value::Table(toml::value::Table::new());
    }

    let mut current = val;
    for segment in parents {
        current = current
            .as_table_mut()
            .expect("current was just ensured to be a table")
            .entry((*segment).to_owned())
            .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
        if !current.is_table() {
            *current = toml::Value::Table(toml::value::Table::new());
        }
    }

    if let Some(table) = current.as_table_mut() {
        table.insert((*leaf).to_owned(), new_val);
    }
}

fn walk_strings_mut(val: &mut toml::Value, f: &dyn Fn(&str) -> String) {
    match val {
        toml::Value::String(s) => *s = f(s),
        toml::Value::Array(items) => {
            for item in items {
                walk_strings_mut(item, f);
            }
        },
        toml::Value::Table(table) => {
            for v in table.values_mut() {
                walk_strings_mut(v, f);
            }
        },
        _ => {},
    }
}

/// Expand `${VAR}` occurrences in `input`, consulting `env_vars` only for
/// names `allow` accepts. Unresolved or disallowed placeholders are left
/// verbatim.
fn interpolate(input: &str, env_vars: &HashMap<String, String>, allow: &dyn Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let var_name = &after[..end];
        let placeholder = &rest[start..start + 2 + end + 1];
        if allow(var_name) {
            if let Some(value) = env_vars.get(var_name) {
                out.push_str(value);
            } else {
                out.push_str(placeholder);
            }
        } else {
            out.push_str(placeholder);
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
