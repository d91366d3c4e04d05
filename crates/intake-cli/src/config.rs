//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_USER_ID: &str = "admin";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Configuration for intake
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat service base URL
    pub base_url: Option<String>,
    /// User id sent with every request
    pub user_id: Option<String>,
    /// Conversation language code
    pub language: Option<String>,
    /// JSON file with the user context object
    pub user_context_path: Option<String>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// Color theme (dark, light)
    pub theme: Option<String>,
}

/// Values given on the command line; they win over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub user_id: Option<String>,
    pub language: Option<String>,
    pub context_file: Option<PathBuf>,
}

/// Effective settings after merging flags, config and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub user_id: String,
    pub language: String,
    pub user_context_path: PathBuf,
    pub tui: bool,
    pub theme: String,
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("intake")
    }

    /// Config file path; `INTAKE_CONFIG_PATH` takes precedence
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("INTAKE_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from a path; a missing or broken file yields the defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            user_id: Some(DEFAULT_USER_ID.to_string()),
            language: Some(DEFAULT_LANGUAGE.to_string()),
            user_context_path: None,
            tui: Some(true),
            theme: Some("dark".to_string()),
        };

        default_config.save_to(&path)?;
        Ok(path)
    }
}

/// Per-user data directory (user context, log file)
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("intake")
}

pub fn default_user_context_path() -> PathBuf {
    data_dir().join("user_context.json")
}

pub fn log_path() -> PathBuf {
    data_dir().join("intake.log")
}

impl Settings {
    pub fn resolve(config: &Config, overrides: Overrides) -> Self {
        let user_context_path = overrides
            .context_file
            .or_else(|| config.user_context_path.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_user_context_path);

        Self {
            base_url: overrides
                .base_url
                .or_else(|| config.base_url.clone())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            user_id: overrides
                .user_id
                .or_else(|| config.user_id.clone())
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            language: overrides
                .language
                .or_else(|| config.language.clone())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            user_context_path,
            tui: config.tui.unwrap_or(true),
            theme: config.theme.clone().unwrap_or_else(|| "dark".to_string()),
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# intake configuration file
# Place at ~/.config/intake/config.toml (Linux) or set INTAKE_CONFIG_PATH

# Chat service base URL
base_url = "http://localhost:8000"

# User id sent with every request
user_id = "admin"

# Conversation language
language = "en"

# JSON object sent as user_context with every message (optional)
# Defaults to <data dir>/intake/user_context.json when present
# user_context_path = "~/.local/share/intake/user_context.json"

# Whether to use TUI mode by default (true by default)
# Set to false for simple stdin/stdout mode
tui = true

# Color theme (dark, light)
theme = "dark"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing.toml"));
        assert_eq!(config, Config::default());

        let settings = Settings::resolve(&config, Overrides::default());
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.user_id, DEFAULT_USER_ID);
        assert_eq!(settings.language, DEFAULT_LANGUAGE);
        assert!(settings.tui);
    }

    #[test]
    fn test_flags_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "base_url = \"http://svc:9000\"\nuser_id = \"u7\"\nlanguage = \"fr\"\ntui = false\n",
        )
        .unwrap();

        let config = Config::load_from(&path);
        let settings = Settings::resolve(
            &config,
            Overrides {
                user_id: Some("cli-user".into()),
                ..Default::default()
            },
        );

        assert_eq!(settings.base_url, "http://svc:9000");
        assert_eq!(settings.user_id, "cli-user");
        assert_eq!(settings.language, "fr");
        assert!(!settings.tui);
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = [").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(config.tui, Some(true));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            base_url: Some("http://x".into()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }
}
