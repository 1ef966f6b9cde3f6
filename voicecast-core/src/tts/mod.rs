//! Speech synthesis client

pub mod elevenlabs;
pub mod engine;
pub mod mock;
pub mod provider;
pub mod stream;
pub mod types;

pub use elevenlabs::{ElevenLabs, ElevenLabsConfig};
pub use engine::{save_audio, ConvertOptions, RetryPolicy, TtsEngine};
pub use provider::SpeechSynthesizer;
pub use stream::AudioStream;
pub use types::*;
