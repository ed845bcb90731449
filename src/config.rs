//! Configuration management for toolbelt.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::tools::ConflictPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub shell: ShellConfig,
}

/// Which built-in modules are merged, and how name collisions resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,
    #[serde(default)]
    pub conflict: ConflictPolicy,
}

fn default_modules() -> Vec<String> {
    vec!["file".to_string(), "shell".to_string(), "summary".to_string()]
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            modules: default_modules(),
            conflict: ConflictPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Validate arguments against the tool schema before invoking.
    #[serde(default)]
    pub strict: bool,
    /// Results longer than this many characters are truncated; 0 disables.
    #[serde(default = "default_max_result_chars")]
    pub max_result_chars: usize,
}

fn default_max_result_chars() -> usize {
    4000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            strict: false,
            max_result_chars: default_max_result_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    #[serde(default = "max_timeout_secs")]
    pub max_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn max_timeout_secs() -> u64 {
    300
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            max_timeout_secs: max_timeout_secs(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".toolbelt").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            Self::read(&config_path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from an explicit path; the file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(strict) = var("TOOLBELT_STRICT") {
            self.dispatch.strict = matches!(
                strict.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(conflict) = var("TOOLBELT_CONFLICT") {
            self.registry.conflict = conflict
                .parse::<ConflictPolicy>()
                .map_err(|e: String| anyhow!(e))
                .context("Invalid TOOLBELT_CONFLICT")?;
        }
        if let Some(max) = var("TOOLBELT_MAX_RESULT_CHARS") {
            self.dispatch.max_result_chars = max
                .trim()
                .parse()
                .with_context(|| format!("Invalid TOOLBELT_MAX_RESULT_CHARS: {}", max))?;
        }
        Ok(())
    }

    pub fn save_default() -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        Self::default().save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}
