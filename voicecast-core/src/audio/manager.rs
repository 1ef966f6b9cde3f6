use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use bytes::Bytes;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::decode::decode_audio;
use super::output::{default_output, AudioOutput, PlaybackControl};
use crate::error::{Result, VoiceError};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What to play: an in-memory clip or a file on disk
#[derive(Debug, Clone)]
pub enum AudioSource {
    Bytes(Bytes),
    File(PathBuf),
}

impl From<Bytes> for AudioSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for AudioSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<PathBuf> for AudioSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for AudioSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    /// Wait for the clip to finish before returning
    pub blocking: bool,
    /// Gain in [0.0, 1.0], applied before playback starts
    pub volume: f32,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            blocking: true,
            volume: 1.0,
        }
    }
}

impl PlayOptions {
    pub fn background() -> Self {
        Self {
            blocking: false,
            ..Self::default()
        }
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

/// Handle to one playback. Cloning shares the same playback.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    control: Arc<PlaybackControl>,
    poll_interval: Duration,
}

impl PlaybackHandle {
    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn is_active(&self) -> bool {
        self.control.is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    pub fn set_volume(&self, volume: f32) {
        self.control.set_volume(volume);
    }

    /// Wait until the clip finishes or is stopped
    pub async fn wait(&self) {
        while self.is_active() {
            sleep(self.poll_interval).await;
        }
    }
}

/// Holds the manager's "is playing" flag for one playback generation and
/// lowers it on drop, unless a newer playback has taken the flag since.
struct PlayingFlag {
    active: Arc<AtomicU64>,
    generation: u64,
}

impl PlayingFlag {
    fn raise(active: Arc<AtomicU64>, generation: u64) -> Self {
        active.store(generation, Ordering::SeqCst);
        Self { active, generation }
    }
}

impl Drop for PlayingFlag {
    fn drop(&mut self) {
        let _ = self.active.compare_exchange(
            self.generation,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

/// Local playback service. One clip plays at a time: starting a new clip
/// stops the previous one. Callers sequence synthesis and playback
/// themselves; nothing here queues.
pub struct AudioManager {
    output: Arc<dyn AudioOutput>,
    current: Mutex<Option<PlaybackHandle>>,
    active: Arc<AtomicU64>,
    next_generation: AtomicU64,
    poll_interval: Duration,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(default_output())
    }
}

impl AudioManager {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            current: Mutex::new(None),
            active: Arc::new(AtomicU64::new(0)),
            next_generation: AtomicU64::new(0),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Play a clip.
    ///
    /// Blocking playback returns once the clip ends or is stopped.
    /// Background playback returns immediately; the returned handle tracks
    /// it and a watcher task lowers the playing flag when it ends. The flag
    /// is never left raised by a failed call or a finished blocking call.
    pub async fn play(
        &self,
        source: impl Into<AudioSource>,
        options: PlayOptions,
    ) -> Result<PlaybackHandle> {
        let (data, extension) = load_source(source.into()).await?;

        let decoded = tokio::task::spawn_blocking(move || decode_audio(data, extension.as_deref()))
            .await
            .map_err(|e| VoiceError::PlaybackFailure(anyhow!("Decoder task failed: {e}")))?
            .inspect_err(|e| error!("Failed to play audio: {e}"))?;

        self.stop();

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let flag = PlayingFlag::raise(self.active.clone(), generation);

        let control = Arc::new(PlaybackControl::new(options.volume));
        self.output
            .start(decoded, control.clone())
            .inspect_err(|e| error!("Failed to play audio: {e}"))?;

        let handle = PlaybackHandle {
            control,
            poll_interval: self.poll_interval,
        };
        *self.current.lock().expect("playback lock poisoned") = Some(handle.clone());
        info!(volume = options.volume, blocking = options.blocking, "Playing audio...");

        if options.blocking {
            handle.wait().await;
            drop(flag);
            debug!("Playback finished");
            return Ok(handle);
        }

        let watched = handle.clone();
        tokio::spawn(async move {
            watched.wait().await;
            drop(flag);
            debug!("Background playback finished");
        });

        Ok(handle)
    }

    /// Stop the current playback; does nothing when idle
    pub fn stop(&self) {
        let current = self.current.lock().expect("playback lock poisoned").take();
        if let Some(handle) = current {
            if handle.is_active() {
                handle.stop();
                info!("Playback stopped");
            }
        }
        self.active.store(0, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        if let Some(handle) = self.current_handle() {
            if handle.is_active() {
                handle.pause();
                info!("Playback paused");
            }
        }
    }

    pub fn resume(&self) {
        if let Some(handle) = self.current_handle() {
            handle.resume();
            info!("Playback resumed");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.load(Ordering::SeqCst) != 0
    }

    pub fn current_handle(&self) -> Option<PlaybackHandle> {
        self.current.lock().expect("playback lock poisoned").clone()
    }
}

async fn load_source(source: AudioSource) -> Result<(Bytes, Option<String>)> {
    match source {
        AudioSource::Bytes(bytes) => {
            if bytes.is_empty() {
                return Err(VoiceError::InvalidInput("Audio buffer is empty".to_string()));
            }
            Ok((bytes, None))
        }
        AudioSource::File(path) => {
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(VoiceError::ResourceNotFound(path));
                }
                Err(e) => {
                    return Err(VoiceError::PlaybackFailure(anyhow!(
                        "Failed to inspect {}: {e}",
                        path.display()
                    )));
                }
            };

            if !metadata.is_file() {
                return Err(VoiceError::InvalidInput(format!(
                    "Not an audio file: {}",
                    path.display()
                )));
            }

            let data = tokio::fs::read(&path).await.map_err(|e| {
                VoiceError::PlaybackFailure(anyhow!("Failed to read {}: {e}", path.display()))
            })?;
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);

            Ok((Bytes::from(data), extension))
        }
    }
}
