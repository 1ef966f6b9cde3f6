use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the synthesis client, the playback service and the
/// configuration loader. Callers match on the variant, not on the message.
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Audio file not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailure(#[from] SynthesisError),

    #[error("Playback failed: {0}")]
    PlaybackFailure(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Persisting an artifact to disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a [`crate::tts::SpeechSynthesizer`]. The underlying
/// cause is carried unmodified.
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// Network failures, rate limiting and server-side errors. Eligible for retry.
    #[error("Transient error: {0}")]
    Transient(anyhow::Error),

    /// The service answered with a non-success status (bad voice id,
    /// authentication, quota exceeded). Never retried.
    #[error("Service rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Terminal error: {0}")]
    Terminal(anyhow::Error),
}

impl SynthesisError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Classify an HTTP status the way the ElevenLabs API uses them: 429 and
    /// 5xx are worth another attempt, everything else is final.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 || (500..600).contains(&status) {
            Self::Transient(anyhow::anyhow!("ElevenLabs API error {status}: {body}"))
        } else {
            Self::Rejected { status, body }
        }
    }
}

impl From<reqwest::Error> for SynthesisError {
    fn from(source: reqwest::Error) -> Self {
        if source.is_timeout() || source.is_connect() || source.is_request() || source.is_body() {
            Self::Transient(anyhow::anyhow!(source))
        } else {
            Self::Terminal(anyhow::anyhow!(source))
        }
    }
}

pub type Result<T, E = VoiceError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(SynthesisError::from_status(429, String::new()).is_transient());
        assert!(SynthesisError::from_status(503, String::new()).is_transient());
        assert!(matches!(
            SynthesisError::from_status(401, "invalid api key".into()),
            SynthesisError::Rejected { status: 401, .. }
        ));
        assert!(!SynthesisError::from_status(404, String::new()).is_transient());
    }

    #[test]
    fn test_synthesis_error_keeps_cause() {
        let err: VoiceError = SynthesisError::Rejected {
            status: 400,
            body: "voice_not_found".into(),
        }
        .into();
        assert!(err.to_string().contains("voice_not_found"));
        assert!(matches!(err, VoiceError::SynthesisFailure(_)));
    }
}
