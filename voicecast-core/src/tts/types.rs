use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

use super::stream::AudioStream;

/// Voice tuning sent with every synthesis request. The service owns the
/// valid domain of each knob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default = "default_stability")]
    pub stability: f32,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
    #[serde(default)]
    pub style: f32,
    #[serde(default = "default_use_speaker_boost")]
    pub use_speaker_boost: bool,
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.8
}

fn default_use_speaker_boost() -> bool {
    true
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: 0.0,
            use_speaker_boost: default_use_speaker_boost(),
        }
    }
}

/// A fully resolved synthesis request
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
    pub output_format: String,
    pub stream: bool,
}

/// Audio produced by one synthesis call
pub enum AudioArtifact {
    Complete(Bytes),
    Streaming(AudioStream),
}

impl AudioArtifact {
    /// The complete buffer, if this artifact was not streamed
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Complete(bytes) => Some(bytes),
            Self::Streaming(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<AudioStream> {
        match self {
            Self::Complete(_) => None,
            Self::Streaming(stream) => Some(stream),
        }
    }
}

impl std::fmt::Debug for AudioArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete(bytes) => write!(f, "AudioArtifact::Complete({} bytes)", bytes.len()),
            Self::Streaming(_) => write!(f, "AudioArtifact::Streaming"),
        }
    }
}

/// Subscription and usage metadata for the account behind the API key.
/// Every field defaults when missing or `null` so a partial response still
/// deserializes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountInfo {
    pub email: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tier: String,
    #[serde(deserialize_with = "null_as_default")]
    pub character_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub character_limit: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub can_extend_character_limit: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_to_extend_character_limit: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub next_character_count_reset_unix: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub voice_limit: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub professional_voice_limit: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub can_use_instant_voice_cloning: bool,
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl AccountInfo {
    pub fn characters_remaining(&self) -> u64 {
        self.character_limit.saturating_sub(self.character_count)
    }

    /// True when nothing was learned about the account
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}
