use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::elevenlabs::{ElevenLabs, ElevenLabsConfig};
use super::provider::SpeechSynthesizer;
use super::types::{AccountInfo, AudioArtifact, SynthesisRequest, Voice, VoiceSettings};
use crate::error::{Result, SynthesisError, VoiceError};
use crate::settings::Config;

/// Per-call overrides for [`TtsEngine::convert`]. Anything left unset falls
/// back to the configuration.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
    pub voice_settings: Option<VoiceSettings>,
    pub output_path: Option<PathBuf>,
    pub stream: bool,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    pub fn model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn settings(mut self, voice_settings: VoiceSettings) -> Self {
        self.voice_settings = Some(voice_settings);
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Retry schedule for transient synthesis failures. Rejections are never
/// retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
            multiplier: 2.0,
        }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis(base.min(self.max_backoff.as_millis() as f64) as u64)
    }

    fn should_retry(&self, error: &SynthesisError, attempt: u32) -> bool {
        error.is_transient() && attempt < self.max_retries
    }
}

/// Converts text to speech through a [`SpeechSynthesizer`], applying
/// configuration defaults, retries and optional persistence.
pub struct TtsEngine {
    config: Arc<Config>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    retry: RetryPolicy,
}

impl TtsEngine {
    pub fn new(config: Arc<Config>, synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        let retry = RetryPolicy::new(config.max_retries);
        Self {
            config,
            synthesizer,
            retry,
        }
    }

    /// Engine backed by the ElevenLabs API
    pub fn elevenlabs(config: Arc<Config>) -> Result<Self> {
        let client = ElevenLabs::new(ElevenLabsConfig::from_config(&config))?;
        Ok(Self::new(config, Box::new(client)))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a request against the configuration defaults. Empty or
    /// whitespace-only text is rejected here, before any network call.
    pub fn build_request(&self, text: &str, options: &ConvertOptions) -> Result<SynthesisRequest> {
        if text.trim().is_empty() {
            return Err(VoiceError::InvalidInput("Text cannot be empty".to_string()));
        }

        Ok(SynthesisRequest {
            text: text.to_string(),
            voice_id: options
                .voice_id
                .clone()
                .unwrap_or_else(|| self.config.default_voice_id.clone()),
            model_id: options
                .model_id
                .clone()
                .unwrap_or_else(|| self.config.default_model_id.clone()),
            voice_settings: options
                .voice_settings
                .clone()
                .unwrap_or_else(|| self.config.default_voice_settings()),
            output_format: self.config.output_format.clone(),
            stream: options.stream,
        })
    }

    /// Convert text to speech.
    ///
    /// In streaming mode the unconsumed chunk stream is returned and the
    /// caller owns persistence; otherwise the complete audio is returned and,
    /// when `output_path` is set, written there.
    pub async fn convert(&self, text: &str, options: ConvertOptions) -> Result<AudioArtifact> {
        let request = self.build_request(text, &options)?;

        if request.stream {
            info!(voice_id = %request.voice_id, "Streaming audio...");
            if options.output_path.is_some() {
                warn!("output_path is ignored in streaming mode; persist the stream instead");
            }
            let stream = self
                .with_retry(|| self.synthesizer.synthesize_stream(&request))
                .await
                .inspect_err(|e| error!("TTS conversion failed: {e}"))?;
            return Ok(AudioArtifact::Streaming(stream));
        }

        info!(
            "Converting text ({} chars) with voice {}",
            request.text.chars().count(),
            request.voice_id
        );
        let start = Instant::now();

        let audio = self
            .with_retry(|| self.synthesizer.synthesize(&request))
            .await
            .inspect_err(|e| error!("TTS conversion failed: {e}"))?;

        info!(
            bytes = audio.len(),
            "Audio generated successfully in {:.2}s",
            start.elapsed().as_secs_f64()
        );

        if let Some(path) = &options.output_path {
            save_audio(&audio, path).await?;
        }

        Ok(AudioArtifact::Complete(audio))
    }

    /// Subscription metadata. Best effort: any failure is logged and an
    /// empty [`AccountInfo`] is returned.
    pub async fn get_account_status(&self) -> AccountInfo {
        match self.synthesizer.account_info().await {
            Ok(info) => info,
            Err(e) => {
                warn!("Failed to get account info: {e}");
                AccountInfo::default()
            }
        }
    }

    pub async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(self.synthesizer.list_voices().await?)
    }

    async fn with_retry<T, F, Fut>(&self, mut operation: F) -> Result<T, SynthesisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SynthesisError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!("Synthesis succeeded after {} retries", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !self.retry.should_retry(&error, attempt) {
                        return Err(error);
                    }

                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.retry.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "Synthesis failed, retrying after backoff"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Write audio to `path`, creating parent directories as needed
pub async fn save_audio(audio: &Bytes, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, audio).await.inspect_err(|e| {
        error!("Failed to save audio to {}: {e}", path.display());
    })?;
    info!("Audio saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::mock::{MockBehavior, MockSynthesizer};
    use rstest::rstest;

    fn config() -> Arc<Config> {
        Arc::new(Config {
            api_key: "test-key".to_string(),
            ..Config::default()
        })
    }

    fn no_backoff(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::ZERO,
            ..RetryPolicy::new(max_retries)
        }
    }

    fn engine(mock: &MockSynthesizer) -> TtsEngine {
        TtsEngine::new(config(), Box::new(mock.clone())).with_retry_policy(no_backoff(3))
    }

    #[rstest]
    #[case("")]
    #[case(" ")]
    #[case("\n\t  ")]
    #[tokio::test]
    async fn test_empty_text_rejected_without_network(#[case] text: &str) {
        let mock = MockSynthesizer::default();
        let engine = engine(&mock);

        let err = engine.convert(text, ConvertOptions::new()).await.unwrap_err();
        assert!(matches!(err, VoiceError::InvalidInput(_)));

        let err = engine
            .convert(text, ConvertOptions::new().streaming(true))
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::InvalidInput(_)));

        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_defaults_come_from_config() {
        let mock = MockSynthesizer::default();
        let engine = engine(&mock);

        engine.convert("hello", ConvertOptions::new()).await.unwrap();

        let request = &mock.captured_requests()[0];
        assert_eq!(request.voice_id, engine.config().default_voice_id);
        assert_eq!(request.model_id, engine.config().default_model_id);
        assert_eq!(request.voice_settings, engine.config().default_voice_settings());
        assert_eq!(request.output_format, "mp3_44100_128");
        assert!(!request.stream);
    }

    #[tokio::test]
    async fn test_overrides_are_forwarded() {
        let mock = MockSynthesizer::default();
        let engine = engine(&mock);
        let settings = VoiceSettings {
            stability: 0.9,
            similarity_boost: 0.3,
            style: 0.2,
            use_speaker_boost: false,
        };

        engine
            .convert(
                "hello",
                ConvertOptions::new()
                    .voice("voice-x")
                    .model("eleven_turbo_v2_5")
                    .settings(settings.clone()),
            )
            .await
            .unwrap();

        let request = &mock.captured_requests()[0];
        assert_eq!(request.voice_id, "voice-x");
        assert_eq!(request.model_id, "eleven_turbo_v2_5");
        assert_eq!(request.voice_settings, settings);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let mock = MockSynthesizer::new(MockBehavior::TransientErrorThenSuccess {
            remaining_errors: 2,
        });
        let engine = engine(&mock);

        let artifact = engine.convert("hello", ConvertOptions::new()).await.unwrap();
        assert_eq!(artifact.as_bytes().unwrap().len(), 100);
        assert_eq!(mock.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_retries_stop_at_max() {
        let mock = MockSynthesizer::new(MockBehavior::AlwaysTransientError);
        let engine = engine(&mock);

        let err = engine.convert("hello", ConvertOptions::new()).await.unwrap_err();
        assert!(matches!(
            err,
            VoiceError::SynthesisFailure(SynthesisError::Transient(_))
        ));
        assert_eq!(mock.get_call_count(), 4);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let mock = MockSynthesizer::new(MockBehavior::Rejected {
            status: 401,
            body: "invalid_api_key".to_string(),
        });
        let engine = engine(&mock);

        let err = engine.convert("hello", ConvertOptions::new()).await.unwrap_err();
        match err {
            VoiceError::SynthesisFailure(SynthesisError::Rejected { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid_api_key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(mock.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_conversion_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp3");
        let mock = MockSynthesizer::new(MockBehavior::AlwaysTransientError);
        let engine = engine(&mock);

        assert!(engine
            .convert("hello", ConvertOptions::new().output(&path))
            .await
            .is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_account_status_is_best_effort() {
        let mock = MockSynthesizer::new(MockBehavior::AlwaysTransientError);
        let engine = engine(&mock);
        assert!(engine.get_account_status().await.is_empty());

        mock.set_behavior(MockBehavior::Success);
        let info = engine.get_account_status().await;
        assert_eq!(info.characters_remaining(), 8800);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::new(10);
        assert_eq!(policy.backoff(0), Duration::from_millis(250));
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(8), Duration::from_secs(4));
    }
}
