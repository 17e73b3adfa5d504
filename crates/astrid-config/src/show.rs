//! Rendering a loaded configuration back for inspection (`astrid config show`).

use crate::merge::FieldSources;
use crate::types::Config;

/// The result of [`crate::loader::load`]: the deserialized configuration, a
/// record of which layer set each field, and the list of files that
/// contributed a layer.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The fully merged, validated configuration.
    pub config: Config,
    /// Dotted field path → the layer that last set it.
    pub field_sources: FieldSources,
    /// Paths of every config file that was found and merged, in precedence
    /// order (system, then user, then workspace).
    pub loaded_files: Vec<String>,
}

/// Output format for rendering a [`ResolvedConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// Re-serialize as TOML.
    Toml,
    /// Re-serialize as pretty-printed JSON.
    Json,
    /// One `path = value  # source` line per field, sorted by path.
    Pretty,
}

impl ResolvedConfig {
    /// Render this configuration in the requested format.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized, which
    /// should not happen for a value that already round-tripped through
    /// [`crate::loader::load`].
    pub fn render(&self, format: ShowFormat) -> Result<String, String> {
        match format {
            ShowFormat::Toml => toml::to_string_pretty(&self.config).map_err(|e| e.to_string()),
            ShowFormat::Json => {
                serde_json::to_string_pretty(&self.config).map_err(|e| e.to_string())
            },
            ShowFormat::Pretty => Ok(self.render_pretty()),
        }
    }

    fn render_pretty(&self) -> String {
        let mut paths: Vec<&String> = self.field_sources.keys().collect();
        paths.sort();

        let toml_value = match toml::Value::try_from(&self.config) {
            Ok(v) => v,
            Err(_) => return String::new(),
        };

        let mut lines = Vec::with_capacity(paths.len());
        for path in paths {
            let segments: Vec<&str> = path.split('.').collect();
            let value = lookup(&toml_value, &segments)
                .map(ToString::to_string)
                .unwrap_or_else(|| "<unset>".to_owned());
            let source = &self.field_sources[path];
            lines.push(format!("{path} = {value}  # {source}"));
        }
        lines.join("\n")
    }
}

fn lookup<'a>(val: &'a toml::Value, path: &[&str]) -> Option<&'a toml::Value> {
    let mut current = val;
    for segment in path {
        current = current.as_table()?.get(*segment)?;
    }
    Some(current)
}
