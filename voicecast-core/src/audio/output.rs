use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::anyhow;

use super::decode::DecodedAudio;
use crate::error::{Result, VoiceError};

/// State shared between a playback handle and the output rendering it.
/// Outputs must call [`PlaybackControl::mark_finished`] when the clip ends,
/// and honor the stop, pause and volume values while rendering.
#[derive(Debug)]
pub struct PlaybackControl {
    finished: AtomicBool,
    stopped: AtomicBool,
    paused: AtomicBool,
    volume: AtomicU32,
}

impl PlaybackControl {
    pub fn new(volume: f32) -> Self {
        Self {
            finished: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            volume: AtomicU32::new(clamp_volume(volume).to_bits()),
        }
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::SeqCst))
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume
            .store(clamp_volume(volume).to_bits(), Ordering::SeqCst);
    }

    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Neither finished nor stopped. A paused clip is still active.
    pub fn is_active(&self) -> bool {
        !self.is_finished() && !self.is_stopped()
    }
}

/// Volume is a gain in [0.0, 1.0]; NaN is treated as silence
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Destination for decoded audio.
///
/// `start` returns once rendering has begun (or failed to begin); the clip
/// then plays in the background under the supplied control.
pub trait AudioOutput: Send + Sync {
    fn start(&self, audio: DecodedAudio, control: Arc<PlaybackControl>) -> Result<()>;
}

/// Output used when no audio backend is compiled in or no device exists
#[derive(Debug, Clone)]
pub struct UnavailableOutput {
    reason: String,
}

impl UnavailableOutput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl AudioOutput for UnavailableOutput {
    fn start(&self, _audio: DecodedAudio, _control: Arc<PlaybackControl>) -> Result<()> {
        Err(VoiceError::PlaybackFailure(anyhow!(
            "No audio output available: {}",
            self.reason
        )))
    }
}

/// Default output for this build: the system device when the `device`
/// feature is enabled and a device exists, otherwise [`UnavailableOutput`].
pub fn default_output() -> Arc<dyn AudioOutput> {
    #[cfg(feature = "device")]
    {
        match super::device::DeviceOutput::new() {
            Ok(output) => Arc::new(output),
            Err(e) => {
                tracing::warn!("Audio device unavailable: {e}");
                Arc::new(UnavailableOutput::new(e.to_string()))
            }
        }
    }

    #[cfg(not(feature = "device"))]
    {
        Arc::new(UnavailableOutput::new(
            "built without the `device` feature",
        ))
    }
}
