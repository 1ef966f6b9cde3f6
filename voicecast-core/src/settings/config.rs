use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::error::{Result, VoiceError};
use crate::tts::types::VoiceSettings;

pub const DEFAULT_VOICE_ID: &str = "JBFqnCBsd6RMkjVDRZzb";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";
pub const DEFAULT_API_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Application configuration. Built once at startup and handed to every
/// component that needs it; nothing reads configuration from global state.
///
/// Every field except the API key has a compiled-in default, so a settings
/// file only needs to name what it changes.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// ElevenLabs API key, sent as the `xi-api-key` header
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_voice_id")]
    pub default_voice_id: String,

    #[serde(default = "default_model_id")]
    pub default_model_id: String,

    /// Output encoding requested from the service, `codec_samplerate[_bitrate]`
    #[serde(default = "default_output_format")]
    pub output_format: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_voice_samples_dir")]
    pub voice_samples_dir: PathBuf,

    /// Voice tuning applied when a request does not carry its own
    #[serde(default)]
    pub voice_defaults: VoiceSettings,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Additional attempts after a transient synthesis failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_voice_id() -> String {
    DEFAULT_VOICE_ID.to_string()
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_output_format() -> String {
    DEFAULT_OUTPUT_FORMAT.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./audio_outputs")
}

fn default_voice_samples_dir() -> PathBuf {
    PathBuf::from("./voice_samples")
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            default_voice_id: default_voice_id(),
            default_model_id: default_model_id(),
            output_format: default_output_format(),
            output_dir: default_output_dir(),
            voice_samples_dir: default_voice_samples_dir(),
            voice_defaults: VoiceSettings::default(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("Config")
            .field("api_key", &api_key)
            .field("default_voice_id", &self.default_voice_id)
            .field("default_model_id", &self.default_model_id)
            .field("output_format", &self.output_format)
            .field("output_dir", &self.output_dir)
            .field("voice_samples_dir", &self.voice_samples_dir)
            .field("voice_defaults", &self.voice_defaults)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Config {
    /// Fail fast on anything that would make every request fail later.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(VoiceError::ConfigurationError(
                "ELEVENLABS_API_KEY not found in environment variables or settings file"
                    .to_string(),
            ));
        }

        let defaults = &self.voice_defaults;
        for (name, value) in [
            ("stability", defaults.stability),
            ("similarity_boost", defaults.similarity_boost),
            ("style", defaults.style),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(VoiceError::ConfigurationError(format!(
                    "voice_defaults.{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(VoiceError::ConfigurationError(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.output_format.trim().is_empty() {
            return Err(VoiceError::ConfigurationError(
                "output_format must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Create the output and voice sample directories if they are missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.output_dir, &self.voice_samples_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                VoiceError::ConfigurationError(format!(
                    "Failed to create directory {}: {e}",
                    dir.display()
                ))
            })?;
        }
        Ok(())
    }

    pub fn default_voice_settings(&self) -> VoiceSettings {
        self.voice_defaults.clone()
    }

    /// File extension implied by the configured output format, e.g.
    /// `mp3_44100_128` -> `mp3`.
    pub fn output_extension(&self) -> &str {
        self.output_format
            .split('_')
            .next()
            .filter(|codec| !codec.is_empty())
            .unwrap_or("mp3")
    }
}
