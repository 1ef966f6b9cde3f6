use async_trait::async_trait;
use bytes::Bytes;

use super::stream::AudioStream;
use super::types::{AccountInfo, SynthesisRequest, Voice};
use crate::error::SynthesisError;

/// A remote text-to-speech service. Each call is exactly one request; retry
/// policy lives in [`super::engine::TtsEngine`].
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize the complete audio for a request
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, SynthesisError>;

    /// Start a streamed synthesis; chunks arrive in the order the service sends them
    async fn synthesize_stream(
        &self,
        request: &SynthesisRequest,
    ) -> Result<AudioStream, SynthesisError>;

    /// Subscription and usage metadata
    async fn account_info(&self) -> Result<AccountInfo, SynthesisError>;

    /// List available voices
    async fn list_voices(&self) -> Result<Vec<Voice>, SynthesisError>;
}
