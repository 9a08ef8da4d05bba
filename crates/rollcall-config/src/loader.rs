//! Config file discovery and layered loading.
//!
//! 1. Parse `defaults.toml` into the base tree
//! 2. Merge `~/.rollcall/config.toml` (user)
//! 3. Merge `{workspace}/.rollcall/config.toml` (workspace)
//! 4. Apply env var fallbacks for fields no file set
//! 5. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MiB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load configuration with layered file precedence and the process
/// environment.
///
/// `home_override` is treated as the `.rollcall` directory itself.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    let user_dir = match home_override {
        Some(dir) => dir.to_path_buf(),
        None => home_directory()?.join(".rollcall"),
    };
    load_with_env(workspace_root, &user_dir, &collect_env_vars())
}

/// [`load`] with an explicit user config directory and environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    workspace_root: Option<&Path>,
    user_dir: &Path,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", ConfigLayer::Defaults, &mut field_sources);

    let user_path = user_dir.join("config.toml");
    if let Some(overlay) = try_load_file(&user_path)? {
        deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            ConfigLayer::User,
            &mut field_sources,
        );
        loaded_files.push(user_path.display().to_string());
        info!(path = %user_path.display(), "loaded user config");
    }

    if let Some(ws_root) = workspace_root {
        let ws_path = ws_root.join(".rollcall").join("config.toml");
        if let Some(overlay) = try_load_file(&ws_path)? {
            deep_merge_tracking(
                &mut merged,
                &overlay,
                "",
                ConfigLayer::Workspace,
                &mut field_sources,
            );
            loaded_files.push(ws_path.display().to_string());
            info!(path = %ws_path.display(), "loaded workspace config");
        }
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a specific file path (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let Some(value) = try_load_file(path)? else {
        return Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    };
    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    // Checked after reading so there is no window between stat and read.
    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    fn write_config(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("config.toml"), body).unwrap();
    }

    #[test]
    fn defaults_deserialize_to_default_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_without_files_uses_defaults() {
        let home = tempfile::tempdir().unwrap();
        let resolved = load_with_env(None, home.path(), &no_env()).unwrap();
        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.source_of("registration.minimum_age"),
            Some(ConfigLayer::Defaults)
        );
    }

    #[test]
    fn workspace_overrides_user() {
        let home = tempfile::tempdir().unwrap();
        let ws = tempfile::tempdir().unwrap();
        write_config(
            home.path(),
            "[registration]\nminimum_age = 16\n[logging]\nlevel = \"debug\"\n",
        );
        write_config(
            &ws.path().join(".rollcall"),
            "[registration]\nminimum_age = 18\n",
        );

        let resolved = load_with_env(Some(ws.path()), home.path(), &no_env()).unwrap();
        assert_eq!(resolved.config.registration.minimum_age, 18);
        assert_eq!(resolved.config.logging.level, "debug");
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(
            resolved.source_of("registration.minimum_age"),
            Some(ConfigLayer::Workspace)
        );
    }

    #[test]
    fn env_is_fallback_only() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[logging]\nlevel = \"warn\"\n");
        let env: HashMap<String, String> = [
            ("ROLLCALL_LOG_LEVEL", "trace"),
            ("ROLLCALL_MINIMUM_AGE", "21"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let resolved = load_with_env(None, home.path(), &env).unwrap();
        assert_eq!(resolved.config.logging.level, "warn");
        assert_eq!(resolved.config.registration.minimum_age, 21);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[registration]\nminimum_age = 0\n");
        let err = load_with_env(None, home.path(), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[registration\nminimum_age = ");
        let err = load_with_env(None, home.path(), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let home = tempfile::tempdir().unwrap();
        let padding = "#".repeat(1_048_577);
        write_config(home.path(), &padding);
        let err = load_with_env(None, home.path(), &no_env()).unwrap_err();
        assert!(err.to_string().contains("byte limit"));
    }

    #[test]
    fn load_file_missing_is_read_error() {
        let result = load_file(Path::new("/nonexistent/rollcall/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn load_file_reads_single_file() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "[audit]\ncapture_enabled = false\n");
        let config = load_file(&dir.path().join("config.toml")).unwrap();
        assert!(!config.audit.capture_enabled);
        assert_eq!(config.registration.minimum_age, 13);
    }
}
