//! ElevenLabs text-to-speech implementation

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::SpeechSynthesizer;
use super::stream::AudioStream;
use super::types::{null_as_default, AccountInfo, SynthesisRequest, Voice, VoiceSettings};
use crate::error::{SynthesisError, VoiceError};
use crate::settings::config::{Config, DEFAULT_API_BASE_URL};

const API_KEY_HEADER: &str = "xi-api-key";

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub base_url: String,
    /// Bounds connecting, complete non-streaming responses, and the wait for
    /// streaming response headers
    pub request_timeout: Duration,
}

impl ElevenLabsConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

pub struct ElevenLabs {
    config: ElevenLabsConfig,
    client: Client,
}

impl ElevenLabs {
    pub fn new(config: ElevenLabsConfig) -> Result<Self, VoiceError> {
        let client = Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                VoiceError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    fn synthesis_request(&self, request: &SynthesisRequest, stream: bool) -> reqwest::RequestBuilder {
        let mut url = format!(
            "{}/text-to-speech/{}",
            self.config.base_url, request.voice_id
        );
        if stream {
            url.push_str("/stream");
        }

        let body = SynthesizeRequest {
            text: &request.text,
            model_id: &request.model_id,
            voice_settings: &request.voice_settings,
        };

        self.client
            .post(&url)
            .query(&[("output_format", request.output_format.as_str())])
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
    }
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

#[derive(Deserialize)]
struct UserResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    subscription: AccountInfo,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<Voice>,
}

async fn check_status(response: Response) -> Result<Response, SynthesisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(?status, %body, "ElevenLabs API returned error");
    Err(SynthesisError::from_status(status.as_u16(), body))
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabs {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, SynthesisError> {
        debug!(voice_id = %request.voice_id, model_id = %request.model_id, "Sending synthesis request");

        let response = self
            .synthesis_request(request, false)
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.bytes().await?)
    }

    async fn synthesize_stream(
        &self,
        request: &SynthesisRequest,
    ) -> Result<AudioStream, SynthesisError> {
        debug!(voice_id = %request.voice_id, model_id = %request.model_id, "Sending streaming synthesis request");

        let response = tokio::time::timeout(
            self.config.request_timeout,
            self.synthesis_request(request, true).send(),
        )
        .await
        .map_err(|_| {
            SynthesisError::Transient(anyhow::anyhow!(
                "Timed out after {:?} waiting for streaming response",
                self.config.request_timeout
            ))
        })??;

        let response = check_status(response).await?;
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| VoiceError::SynthesisFailure(e.into())));

        Ok(AudioStream::new(chunks))
    }

    async fn account_info(&self) -> Result<AccountInfo, SynthesisError> {
        let response = self
            .client
            .get(format!("{}/user", self.config.base_url))
            .header(API_KEY_HEADER, &self.config.api_key)
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let user: UserResponse = check_status(response).await?.json().await.map_err(|e| {
            SynthesisError::Terminal(anyhow::anyhow!("Failed to parse user response: {e}"))
        })?;

        let mut info = user.subscription;
        if info.email.is_none() {
            info.email = user.email;
        }
        Ok(info)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, SynthesisError> {
        let response = self
            .client
            .get(format!("{}/voices", self.config.base_url))
            .header(API_KEY_HEADER, &self.config.api_key)
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let voices: VoicesResponse = check_status(response).await?.json().await.map_err(|e| {
            SynthesisError::Terminal(anyhow::anyhow!("Failed to parse voices response: {e}"))
        })?;

        Ok(voices.voices)
    }
}
