//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/ft/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use filter_tree::DEFAULT_HISTORY_CAPACITY;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Environment variable overriding the config file path.
pub const CONFIG_ENV: &str = "FT_CONFIG";

/// Author recorded when neither the flag, the config nor `$USER` provide one.
const FALLBACK_AUTHOR: &str = "ft";

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Default author for new trees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Undo history settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            created_by: None,
            history: HistoryConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Number of undo steps kept while replaying a script.
    pub fn history_capacity(&self) -> usize {
        self.history.capacity.unwrap_or(DEFAULT_HISTORY_CAPACITY)
    }

    /// Author for new trees: config value, then `$USER`, then a fixed fallback.
    pub fn author(&self) -> String {
        self.created_by
            .clone()
            .or_else(|| env::var("USER").ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| FALLBACK_AUTHOR.to_string())
    }
}

/// History configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

/// Output configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Gets the config file path.
///
/// `FT_CONFIG` wins, then `$XDG_CONFIG_HOME/ft/config.toml`, then
/// `~/.config/ft/config.toml` on all platforms.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("ft").join("config.toml"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("ft").join("config.toml"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Loads the configuration from disk. A missing file yields the defaults.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Migrates config to current version if needed.
fn migrate_config(mut config: Config) -> Result<Config> {
    // Version 1 is the only schema so far.
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk.
fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        println!("Settings:");
        println!("  created_by: {}", config.author());
        println!("\n[history]");
        println!("  capacity: {}", config.history_capacity());
        println!("\n[output]");
        println!(
            "  color: {}",
            config.output.color.map_or("auto".to_string(), |c| c.to_string())
        );
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    let path = get_config_path()?;

    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&config)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": opts.value,
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, opts.value);
    }

    Ok(())
}

/// Applies a `key = value` setting to the config.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key.split_once('.') {
        None if key == "created_by" => {
            if value.trim().is_empty() {
                return Err(CommandError::Config("created_by must not be empty".to_string()));
            }
            config.created_by = Some(value.to_string());
        }
        Some(("history", "capacity")) => {
            let capacity: usize = value.parse().map_err(|_| {
                CommandError::Config(format!(
                    "Invalid history.capacity value '{}'. Use a positive integer",
                    value
                ))
            })?;
            if capacity == 0 {
                return Err(CommandError::Config(
                    "history.capacity must be at least 1".to_string(),
                ));
            }
            config.history.capacity = Some(capacity);
        }
        Some(("output", "color")) => {
            config.output.color = Some(parse_bool(value)?);
        }
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: created_by, history.capacity, output.color",
                key
            )));
        }
    }
    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Parses a boolean value from string.
pub(crate) fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(CommandError::Config(format!(
            "Invalid boolean value '{}'. Use true/false, yes/no, 1/0, or on/off",
            s
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    /// Points `FT_CONFIG` at `path` for the duration of `f`.
    fn with_config_env<T>(path: &std::path::Path, f: impl FnOnce() -> T) -> T {
        let original = env::var(CONFIG_ENV).ok();
        env::set_var(CONFIG_ENV, path);
        let result = f();
        match original {
            Some(value) => env::set_var(CONFIG_ENV, value),
            None => env::remove_var(CONFIG_ENV),
        }
        result
    }

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("YES").unwrap());
        assert!(parse_bool("on").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.created_by.is_none());
        assert_eq!(config.history_capacity(), DEFAULT_HISTORY_CAPACITY);
        assert!(config.output.color.is_none());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            version = 1
            created_by = "alice"

            [history]
            capacity = 10

            [output]
            color = false
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.author(), "alice");
        assert_eq!(config.history_capacity(), 10);
        assert_eq!(config.output.color, Some(false));
    }

    #[test]
    fn test_config_deserialization_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.history_capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_config_serialization_skips_unset() {
        let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(toml_str.contains("version = 1"));
        assert!(!toml_str.contains("created_by"));
        assert!(!toml_str.contains("capacity"));
    }

    #[test]
    fn test_migrate_config_sets_current_version() {
        let config = Config {
            version: 0,
            ..Config::default()
        };
        assert_eq!(migrate_config(config).unwrap().version, CONFIG_VERSION);
    }

    #[test]
    fn test_apply_setting() {
        let mut config = Config::default();
        apply_setting(&mut config, "created_by", "bob").unwrap();
        apply_setting(&mut config, "history.capacity", "5").unwrap();
        apply_setting(&mut config, "output.color", "off").unwrap();

        assert_eq!(config.created_by.as_deref(), Some("bob"));
        assert_eq!(config.history_capacity(), 5);
        assert_eq!(config.output.color, Some(false));
    }

    #[test]
    fn test_apply_setting_rejects_bad_input() {
        let mut config = Config::default();
        assert!(apply_setting(&mut config, "history.capacity", "0").is_err());
        assert!(apply_setting(&mut config, "history.capacity", "lots").is_err());
        assert!(apply_setting(&mut config, "created_by", " ").is_err());
        assert!(apply_setting(&mut config, "token", "x").is_err());
        assert!(apply_setting(&mut config, "output.theme", "dark").is_err());
    }

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        let resolved = with_config_env(&path, get_config_path).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    #[serial]
    fn test_load_missing_config_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.toml");
        let config = with_config_env(&path, load_config).unwrap();
        assert_eq!(config.history_capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    #[serial]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let reloaded = with_config_env(&path, || {
            let mut config = Config::default();
            apply_setting(&mut config, "created_by", "carol")?;
            apply_setting(&mut config, "history.capacity", "7")?;
            save_config(&config)?;
            load_config()
        })
        .unwrap();

        assert!(path.exists());
        assert_eq!(reloaded.author(), "carol");
        assert_eq!(reloaded.history_capacity(), 7);
    }

    #[test]
    #[serial]
    fn test_load_invalid_config_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "version = [").unwrap();

        let err = with_config_env(&path, load_config).unwrap_err();
        assert!(matches!(err, CommandError::Config(_)));
    }
}
