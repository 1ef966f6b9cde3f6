//! Audio playback on the default output device using cpal
//! Resamples from source rate to native device rate if needed

use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfig};
use rubato::{FftFixedIn, Resampler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

use super::decode::DecodedAudio;
use super::output::{AudioOutput, PlaybackControl};
use crate::error::{Result, VoiceError};

const WATCH_INTERVAL: Duration = Duration::from_millis(20);

/// Plays clips on the host's default output device. `cpal::Stream` is not
/// `Send`, so every clip gets a dedicated thread that owns its stream until
/// the clip finishes or is stopped.
pub struct DeviceOutput {
    device_name: String,
}

impl DeviceOutput {
    /// Fails if the host has no default output device
    pub fn new() -> Result<Self> {
        let (device, _) = open_default_device().map_err(VoiceError::PlaybackFailure)?;
        let device_name = device.name().unwrap_or_else(|_| "default".to_string());
        debug!(%device_name, "Using audio output device");
        Ok(Self { device_name })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl AudioOutput for DeviceOutput {
    fn start(&self, audio: DecodedAudio, control: Arc<PlaybackControl>) -> Result<()> {
        let (ready_tx, ready_rx) = mpsc::channel::<anyhow::Result<()>>();

        thread::Builder::new()
            .name("voicecast-playback".to_string())
            .spawn(move || {
                let stream = match start_stream(audio, control.clone()) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        control.mark_finished();
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while control.is_active() {
                    thread::sleep(WATCH_INTERVAL);
                }
                drop(stream);
                control.mark_finished();
            })
            .context("failed to spawn playback thread")
            .map_err(VoiceError::PlaybackFailure)?;

        ready_rx
            .recv()
            .map_err(|_| anyhow!("playback thread exited before starting"))
            .and_then(|started| started)
            .map_err(VoiceError::PlaybackFailure)
    }
}

fn open_default_device() -> anyhow::Result<(cpal::Device, SupportedStreamConfig)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no output device available")?;

    let supported_config = device
        .default_output_config()
        .context("failed to get default output config")?;

    Ok((device, supported_config))
}

fn start_stream(audio: DecodedAudio, control: Arc<PlaybackControl>) -> anyhow::Result<Stream> {
    let (device, supported_config) = open_default_device()?;

    let native_rate = supported_config.sample_rate().0;
    let native_channels = supported_config.channels() as usize;
    let sample_format = supported_config.sample_format();
    let config: StreamConfig = supported_config.into();

    let resampled = if audio.sample_rate == native_rate {
        audio.samples
    } else {
        resample(&audio.samples, audio.sample_rate, native_rate)?
    };

    let samples = if native_channels > 1 {
        expand_to_channels(&resampled, native_channels)
    } else {
        resampled
    };

    let samples = Arc::new(samples);
    let position = Arc::new(AtomicUsize::new(0));

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, samples, position, control)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, samples, position, control)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, samples, position, control)?,
        format => anyhow::bail!("unsupported sample format: {:?}", format),
    };

    stream.play().context("failed to start playback stream")?;
    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    samples: Arc<Vec<f32>>,
    position: Arc<AtomicUsize>,
    control: Arc<PlaybackControl>,
) -> anyhow::Result<Stream>
where
    T: SizedSample + FromSample<f32> + Default + Send + 'static,
{
    let silence = T::from_sample(0.0f32);
    let on_error = stream_error_handler(control.clone());
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if control.is_paused() || control.is_stopped() {
                    data.fill(silence);
                    return;
                }

                let pos = position.load(Ordering::SeqCst);
                let remaining = samples.len().saturating_sub(pos);

                if remaining == 0 {
                    data.fill(silence);
                    control.mark_finished();
                    return;
                }

                let volume = control.volume();
                let to_copy = remaining.min(data.len());
                for (i, &sample) in samples[pos..pos + to_copy].iter().enumerate() {
                    data[i] = T::from_sample(sample * volume);
                }

                if to_copy < data.len() {
                    data[to_copy..].fill(silence);
                }

                position.store(pos + to_copy, Ordering::SeqCst);
            },
            on_error,
            None,
        )
        .context("failed to build output stream")
}

/// A stream that errors may never call the data callback again, so the clip
/// is stopped to release the watcher thread and any waiter.
fn stream_error_handler(
    control: Arc<PlaybackControl>,
) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| {
        error!(error = ?err, "playback stream error");
        control.stop();
    }
}

fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> anyhow::Result<Vec<f32>> {
    let chunk_size = 1024;
    let mut resampler =
        FftFixedIn::<f32>::new(source_rate as usize, target_rate as usize, chunk_size, 2, 1)
            .context("failed to create resampler")?;

    let mut output = Vec::new();
    let mut pos = 0;

    while pos < samples.len() {
        let frames_needed = resampler.input_frames_next();
        let end = (pos + frames_needed).min(samples.len());

        let mut input_chunk = samples[pos..end].to_vec();
        if input_chunk.len() < frames_needed {
            input_chunk.resize(frames_needed, 0.0);
        }

        let input = vec![input_chunk];
        match resampler.process(&input, None) {
            Ok(resampled) => {
                if let Some(chunk) = resampled.into_iter().next() {
                    output.extend(chunk);
                }
            }
            Err(e) => {
                anyhow::bail!("resampling failed: {:?}", e);
            }
        }

        pos = end;
    }

    Ok(output)
}

fn expand_to_channels(samples: &[f32], channels: usize) -> Vec<f32> {
    let mut output = Vec::with_capacity(samples.len() * channels);
    for &sample in samples {
        for _ in 0..channels {
            output.push(sample);
        }
    }
    output
}
