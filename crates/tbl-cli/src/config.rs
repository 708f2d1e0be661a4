//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tbl_ai::CostRateTable;
use tbl_session::{DEFAULT_MODEL, DEFAULT_PROMPTS_DIR, DEFAULT_REQUEST_TIMEOUT, SessionConfig};

/// Configuration for tbl
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model used for new sessions
    pub model: Option<String>,
    /// Models offered in the model selector
    pub models: Option<Vec<String>>,
    /// Directory of exercise prompt files
    pub prompts_dir: Option<PathBuf>,
    /// Directory that saved conversations are written to
    pub export_dir: Option<PathBuf>,
    /// Completion endpoint (OpenAI compatible)
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// API keys (alternative to environment variables)
    pub api_keys: ApiKeys,
    /// Per-model rates in dollars per million tokens, layered over the built-in table
    pub rates: CostRateTable,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tbl")
    }

    /// Config file location; `TBL_CONFIG_PATH` wins over the platform default
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("TBL_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`. A missing file gives the defaults; a broken
    /// one is reported and also gives the defaults.
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
            model: Some(DEFAULT_MODEL.to_string()),
            prompts_dir: Some(PathBuf::from(DEFAULT_PROMPTS_DIR)),
            tui: Some(true),
            ..Default::default()
        };
        default_config.save_to(&path)?;
        Ok(path)
    }

    /// API key from the config file, falling back to `OPENAI_API_KEY`
    pub fn api_key(&self) -> Option<String> {
        self.api_keys
            .openai
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.prompts_dir
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_DIR))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// A zero timeout disables the bound
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    /// Controller settings, with `model_override` (from the command line)
    /// taking precedence over the file
    pub fn session_config(&self, model_override: Option<String>) -> SessionConfig {
        let defaults = SessionConfig::default();

        let mut rates = CostRateTable::builtin();
        rates.merge(&self.rates);

        SessionConfig {
            model: model_override
                .or_else(|| self.model.clone())
                .unwrap_or(defaults.model),
            models: self.models.clone().unwrap_or(defaults.models),
            rates,
            request_timeout: self.request_timeout(),
        }
    }
}

/// Replace a leading `~` with the home directory. Paths without one, or with
/// no known home directory, are returned unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Directory for the TUI-mode log file
pub fn log_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tbl")
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# tbl configuration file
# Place at ~/.config/tbl/config.toml (Linux), ~/Library/Application Support/tbl/config.toml (Mac)
# or %APPDATA%\tbl\config.toml (Windows). TBL_CONFIG_PATH overrides the location.

# Model used for new sessions
model = "gpt-4o-mini-2024-07-18"

# Models offered in the model selector (Ctrl+K)
# models = ["gpt-4o-2024-11-20", "gpt-4o-mini-2024-07-18"]

# Directory of exercise prompts, one <exercise>.txt file each
prompts_dir = "systemmessages"

# Where saved conversations are written (defaults to the current directory)
# export_dir = "~/tbl-exports"

# OpenAI compatible endpoint
# base_url = "https://api.openai.com/v1"

# Give up on a reply after this many seconds (0 waits forever)
# request_timeout_secs = 120

# Whether to use TUI mode by default
# Set to false for simple stdin/stdout mode
tui = true

# API key (optional - OPENAI_API_KEY is used otherwise)
[api_keys]
# openai = "sk-..."

# Rates in dollars per million tokens, added to or replacing the built-in ones
# [rates."gpt-4o-2024-11-20"]
# input = 2.50
# output = 10.00
"#
}
