use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::anyhow;

use super::decode::DecodedAudio;
use super::output::{AudioOutput, PlaybackControl};
use crate::error::{Result, VoiceError};

/// Output double that "plays" a clip by waiting out a fixed duration on a
/// background thread, honoring stop and pause like a device would.
#[derive(Clone)]
pub struct MockOutput {
    play_duration: Duration,
    fail_on_start: bool,
    started: Arc<Mutex<Vec<(DecodedAudio, f32)>>>,
}

impl Default for MockOutput {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl MockOutput {
    pub fn new(play_duration: Duration) -> Self {
        Self {
            play_duration,
            fail_on_start: false,
            started: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Simulate a device that refuses to open
    pub fn failing() -> Self {
        Self {
            fail_on_start: true,
            ..Self::default()
        }
    }

    /// Clips handed to this output, with the volume in effect at start
    pub fn started(&self) -> Vec<(DecodedAudio, f32)> {
        self.started.lock().unwrap().clone()
    }

    pub fn start_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }
}

impl AudioOutput for MockOutput {
    fn start(&self, audio: DecodedAudio, control: Arc<PlaybackControl>) -> Result<()> {
        if self.fail_on_start {
            return Err(VoiceError::PlaybackFailure(anyhow!("mock device failure")));
        }

        self.started
            .lock()
            .unwrap()
            .push((audio, control.volume()));

        let play_duration = self.play_duration;
        thread::spawn(move || {
            let mut remaining = play_duration;
            let tick = Duration::from_millis(5);
            while !remaining.is_zero() && !control.is_stopped() {
                let started = Instant::now();
                thread::sleep(tick.min(remaining));
                if !control.is_paused() {
                    remaining = remaining.saturating_sub(started.elapsed());
                }
            }
            control.mark_finished();
        });

        Ok(())
    }
}
