use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use super::provider::SpeechSynthesizer;
use super::stream::AudioStream;
use super::types::{AccountInfo, SynthesisRequest, Voice};
use crate::error::SynthesisError;

/// Mock behavior for the mock synthesizer
#[derive(Debug, Clone, Default)]
pub enum MockBehavior {
    /// Return the configured payload
    #[default]
    Success,
    /// Return a transient error N times, then succeed
    TransientErrorThenSuccess { remaining_errors: usize },
    /// Always return a transient error
    AlwaysTransientError,
    /// Always answer with a non-success status
    Rejected { status: u16, body: String },
}

/// Deterministic stand-in for the synthesis service. Clones share state, so a
/// test can keep one clone to inspect calls made through another.
#[derive(Clone)]
pub struct MockSynthesizer {
    payload: Bytes,
    chunk_size: usize,
    account: AccountInfo,
    voices: Vec<Voice>,
    behavior: Arc<Mutex<MockBehavior>>,
    call_count: Arc<Mutex<usize>>,
    captured_requests: Arc<Mutex<Vec<SynthesisRequest>>>,
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new(MockBehavior::Success)
    }
}

impl MockSynthesizer {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            payload: Bytes::from((0..100u8).collect::<Vec<u8>>()),
            chunk_size: 16,
            account: AccountInfo {
                email: Some("mock@example.com".to_string()),
                tier: "free".to_string(),
                character_count: 1200,
                character_limit: 10000,
                voice_limit: 3,
                ..AccountInfo::default()
            },
            voices: vec![Voice {
                voice_id: "mock-voice".to_string(),
                name: "Mock".to_string(),
                category: Some("premade".to_string()),
            }],
            behavior: Arc::new(Mutex::new(behavior)),
            call_count: Arc::new(Mutex::new(0)),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Audio returned for every successful request
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Size of the chunks yielded in streaming mode
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_voices(mut self, voices: Vec<Voice>) -> Self {
        self.voices = voices;
        self
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Number of requests that reached the service, failed ones included
    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn captured_requests(&self) -> Vec<SynthesisRequest> {
        self.captured_requests.lock().unwrap().clone()
    }

    pub fn payload(&self) -> Bytes {
        self.payload.clone()
    }

    fn next_outcome(&self) -> Result<(), SynthesisError> {
        *self.call_count.lock().unwrap() += 1;

        let mut behavior = self.behavior.lock().unwrap();
        match &mut *behavior {
            MockBehavior::Success => Ok(()),
            MockBehavior::TransientErrorThenSuccess { remaining_errors } => {
                if *remaining_errors == 0 {
                    return Ok(());
                }
                *remaining_errors -= 1;
                Err(SynthesisError::Transient(anyhow::anyhow!(
                    "Mock transient error (remaining: {})",
                    remaining_errors
                )))
            }
            MockBehavior::AlwaysTransientError => Err(SynthesisError::Transient(anyhow::anyhow!(
                "Mock transient error (always fails)"
            ))),
            MockBehavior::Rejected { status, body } => Err(SynthesisError::Rejected {
                status: *status,
                body: body.clone(),
            }),
        }
    }

    fn record(&self, request: &SynthesisRequest) {
        self.captured_requests.lock().unwrap().push(request.clone());
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, SynthesisError> {
        self.record(request);
        self.next_outcome()?;
        Ok(self.payload.clone())
    }

    async fn synthesize_stream(
        &self,
        request: &SynthesisRequest,
    ) -> Result<AudioStream, SynthesisError> {
        self.record(request);
        self.next_outcome()?;

        let chunks = self
            .payload
            .chunks(self.chunk_size)
            .map(Bytes::copy_from_slice)
            .collect();
        Ok(AudioStream::from_chunks(chunks))
    }

    async fn account_info(&self) -> Result<AccountInfo, SynthesisError> {
        self.next_outcome()?;
        Ok(self.account.clone())
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, SynthesisError> {
        self.next_outcome()?;
        Ok(self.voices.clone())
    }
}
