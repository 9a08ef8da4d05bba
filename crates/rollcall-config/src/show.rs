//! The resolved configuration and its rendering.

use std::fmt::Write as _;

use crate::merge::{ConfigLayer, FieldSources};
use crate::types::Config;

/// A resolved configuration together with source annotations.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final merged configuration.
    pub config: Config,
    /// Dotted field path → which layer set the value.
    pub field_sources: FieldSources,
    /// Config file paths that were loaded (in precedence order).
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// The layer that set a dotted field path.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<ConfigLayer> {
        self.field_sources.get(field).copied()
    }

    /// The config as TOML, each leaf annotated with its source layer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_annotated_toml(&self) -> Result<String, toml::ser::Error> {
        let body = toml::to_string_pretty(&self.config)?;
        let mut output = String::from("# Resolved rollcall configuration\n");
        for path in &self.loaded_files {
            let _ = writeln!(output, "# loaded: {path}");
        }
        output.push('\n');

        let mut section = String::new();
        for line in body.lines() {
            let trimmed = line.trim();
            if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                name.clone_into(&mut section);
            }
            let annotation = trimmed
                .split_once('=')
                .map(|(key, _)| format!("{section}.{}", key.trim()))
                .and_then(|path| self.source_of(&path));
            match annotation {
                Some(layer) => {
                    let _ = writeln!(output, "{line}  # [{layer}]");
                },
                None => {
                    output.push_str(line);
                    output.push('\n');
                },
            }
        }
        Ok(output)
    }

    /// The config as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> ResolvedConfig {
        let mut field_sources = FieldSources::new();
        field_sources.insert("registration.minimum_age".to_owned(), ConfigLayer::User);
        field_sources.insert("logging.level".to_owned(), ConfigLayer::Environment);
        ResolvedConfig {
            config: Config::default(),
            field_sources,
            loaded_files: vec!["/home/test/.rollcall/config.toml".to_owned()],
        }
    }

    #[test]
    fn toml_lines_carry_their_source() {
        let text = resolved().to_annotated_toml().unwrap();
        assert!(text.contains("minimum_age = 13  # [user]"));
        assert!(text.contains("level = \"info\"  # [env]"));
        assert!(text.contains("# loaded: /home/test/.rollcall/config.toml"));
    }

    #[test]
    fn json_round_trips() {
        let json = resolved().to_json().unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Config::default());
    }
}
