pub mod audio;
pub mod error;
pub mod session;
pub mod settings;
pub mod tts;

// Public library API. The CLI only goes through these; everything else is
// public too but may move around.
pub use audio::{AudioManager, AudioSource, PlayOptions, PlaybackHandle};
pub use error::{Result, SynthesisError, VoiceError};
pub use session::{BatchReport, Conversion, Session, VoicePreset};
pub use settings::Config;
pub use tts::{AudioArtifact, ConvertOptions, SpeechSynthesizer, TtsEngine};
