use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{Result, VoiceError};
use crate::settings::config::Config;

pub const ENV_API_KEY: &str = "ELEVENLABS_API_KEY";
pub const ENV_VOICE_ID: &str = "DEFAULT_VOICE_ID";
pub const ENV_OUTPUT_DIR: &str = "OUTPUT_DIRECTORY";
pub const ENV_MODEL_ID: &str = "VOICECAST_MODEL_ID";
pub const ENV_OUTPUT_FORMAT: &str = "VOICECAST_OUTPUT_FORMAT";
pub const ENV_API_BASE_URL: &str = "VOICECAST_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "VOICECAST_REQUEST_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "VOICECAST_MAX_RETRIES";

impl Config {
    /// Load configuration for this process: `.env` in the working directory,
    /// then the settings file, then environment overrides. The result is
    /// validated before it is returned.
    ///
    /// An explicit `settings_path` must exist. Without one, the default
    /// `~/.voicecast/settings.toml` is used only if present.
    pub fn load(settings_path: Option<&Path>) -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(?path, "Loaded environment from .env");
        }

        let contents = match settings_path {
            Some(path) => Some(read_settings_file(path)?),
            None => match default_settings_path() {
                Some(path) if path.exists() => Some(read_settings_file(&path)?),
                _ => None,
            },
        };

        let config = Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())?;
        info!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Build a configuration from settings file contents and an environment
    /// lookup. Environment values win over the file.
    pub fn from_sources<F>(file_contents: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = match file_contents {
            Some(contents) => toml::from_str(contents).map_err(|e| {
                VoiceError::ConfigurationError(format!("Failed to parse settings file: {e}"))
            })?,
            None => Config::default(),
        };

        if let Some(api_key) = env(ENV_API_KEY) {
            config.api_key = api_key;
        }
        if let Some(voice_id) = env(ENV_VOICE_ID) {
            config.default_voice_id = voice_id;
        }
        if let Some(output_dir) = env(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(output_dir);
        }
        if let Some(model_id) = env(ENV_MODEL_ID) {
            config.default_model_id = model_id;
        }
        if let Some(format) = env(ENV_OUTPUT_FORMAT) {
            config.output_format = format;
        }
        if let Some(base_url) = env(ENV_API_BASE_URL) {
            config.api_base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = env(ENV_REQUEST_TIMEOUT) {
            config.request_timeout_secs = parse_env(ENV_REQUEST_TIMEOUT, &timeout)?;
        }
        if let Some(retries) = env(ENV_MAX_RETRIES) {
            config.max_retries = parse_env(ENV_MAX_RETRIES, &retries)?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Default settings location (~/.voicecast/settings.toml)
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".voicecast").join("settings.toml"))
}

pub(super) fn read_settings_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        VoiceError::ConfigurationError(format!(
            "Failed to read settings from {}: {e}",
            path.display()
        ))
    })
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        VoiceError::ConfigurationError(format!("{key} has an invalid value: {value:?}"))
    })
}
