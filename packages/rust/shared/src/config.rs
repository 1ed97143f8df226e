//! Settings for ctxkit.
//!
//! User settings live at `~/.ctxkit/ctxkit.toml`.
//! CLI flags override settings file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CtxKitError, Result};

/// Default settings file name.
const SETTINGS_FILE_NAME: &str = "ctxkit.toml";

/// Default settings directory name under the user's home.
const SETTINGS_DIR_NAME: &str = ".ctxkit";

// ---------------------------------------------------------------------------
// Settings structs (matching ctxkit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level settings, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP fetch settings for URL items.
    #[serde(default)]
    pub http: HttpSettings,

    /// Grok chat settings.
    #[serde(default)]
    pub grok: GrokSettings,
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    5
}
fn default_user_agent() -> String {
    concat!("ctxkit/", env!("CARGO_PKG_VERSION")).into()
}

/// `[grok]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrokSettings {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chat completions endpoint.
    #[serde(default = "default_grok_url")]
    pub url: String,

    /// Default sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for GrokSettings {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            url: default_grok_url(),
            temperature: default_temperature(),
        }
    }
}

fn default_api_key_env() -> String {
    "XAI_API_KEY".into()
}
fn default_grok_url() -> String {
    "https://api.x.ai/v1/chat/completions".into()
}
fn default_temperature() -> f64 {
    0.7
}

// ---------------------------------------------------------------------------
// Settings loading
// ---------------------------------------------------------------------------

/// Get the path to the settings directory (`~/.ctxkit/`).
pub fn settings_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| CtxKitError::config("could not determine home directory"))?;
    Ok(home.join(SETTINGS_DIR_NAME))
}

/// Get the path to the settings file (`~/.ctxkit/ctxkit.toml`).
pub fn settings_file_path() -> Result<PathBuf> {
    Ok(settings_dir()?.join(SETTINGS_FILE_NAME))
}

/// Load settings from disk. Returns defaults if the file does not exist.
pub fn load_settings() -> Result<Settings> {
    let Ok(path) = settings_file_path() else {
        tracing::debug!("no home directory, using default settings");
        return Ok(Settings::default());
    };

    if !path.exists() {
        tracing::debug!(?path, "settings file not found, using defaults");
        return Ok(Settings::default());
    }

    load_settings_from(&path)
}

/// Load settings from a specific file path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| CtxKitError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CtxKitError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default settings file into `dir`, creating it if needed.
/// Returns the path to the created file.
pub fn init_settings(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| CtxKitError::io(dir, e))?;

    let path = dir.join(SETTINGS_FILE_NAME);
    let content = toml::to_string_pretty(&Settings::default())
        .map_err(|e| CtxKitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CtxKitError::io(&path, e))?;
    tracing::info!(?path, "created default settings file");

    Ok(path)
}

/// Read the Grok API key from the env var named in settings.
pub fn resolve_api_key(settings: &GrokSettings) -> Result<String> {
    let var_name = &settings.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(CtxKitError::config(format!(
            "Grok API key not found. Set the {var_name} environment variable."
        ))),
    }
}
