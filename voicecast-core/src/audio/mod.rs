//! Audio decoding and local playback

pub mod decode;
#[cfg(feature = "device")]
pub mod device;
pub mod manager;
pub mod mock;
pub mod output;

pub use decode::{decode_audio, DecodedAudio};
pub use manager::{AudioManager, AudioSource, PlayOptions, PlaybackHandle};
pub use output::{default_output, AudioOutput, PlaybackControl, UnavailableOutput};
