//! Compressed and PCM audio decoding via symphonia

use std::io::{Cursor, ErrorKind};

use anyhow::anyhow;
use bytes::Bytes;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{Result, VoiceError};

/// Mono f32 samples ready for an output device
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

fn playback_error(message: impl std::fmt::Display) -> VoiceError {
    VoiceError::PlaybackFailure(anyhow!("{message}"))
}

/// Decode an in-memory clip (MP3, WAV/PCM or AAC), mixing down to mono.
/// `extension` is a probe hint such as `"mp3"`.
pub fn decode_audio(data: Bytes, extension: Option<&str>) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let format_opts = FormatOptions {
        enable_gapless: false,
        ..Default::default()
    };

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &MetadataOptions::default())
        .map_err(|e| playback_error(format!("Unrecognized audio format: {e}")))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| playback_error("No audio track found"))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| playback_error(format!("Unsupported codec: {e}")))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(playback_error(format!("Failed to read audio: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping undecodable audio packet: {e}");
                continue;
            }
            Err(e) => return Err(playback_error(format!("Failed to decode audio: {e}"))),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let channels = spec.channels.count().max(1);

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        mix_to_mono(sample_buf.samples(), channels, &mut samples);
    }

    if samples.is_empty() || sample_rate == 0 {
        return Err(playback_error("Audio contains no decodable samples"));
    }

    debug!(samples = samples.len(), sample_rate, "Decoded audio");
    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

fn mix_to_mono(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
    if channels == 1 {
        output.extend_from_slice(interleaved);
        return;
    }
    output.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode a sine wave as a 16-bit WAV clip
    pub(crate) fn wav_clip(sample_rate: u32, channels: u16, frames: usize) -> Bytes {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buffer = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut buffer), spec).unwrap();
            for i in 0..frames {
                let t = i as f32 / sample_rate as f32;
                let sample = ((t * 440.0 * std::f32::consts::TAU).sin() * 8000.0) as i16;
                for _ in 0..channels {
                    writer.write_sample(sample).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        Bytes::from(buffer)
    }

    /// MPEG-1 Layer III frames of silence: 32 kbps, 44.1 kHz, mono. Zeroed side
    /// information decodes to 1152 silent samples per frame.
    fn silent_mp3(frames: usize) -> Bytes {
        const HEADER: [u8; 4] = [0xFF, 0xFB, 0x10, 0xC0];
        const FRAME_LEN: usize = 104;
        let mut data = Vec::with_capacity(frames * FRAME_LEN);
        for _ in 0..frames {
            data.extend_from_slice(&HEADER);
            data.resize(data.len() + FRAME_LEN - HEADER.len(), 0);
        }
        Bytes::from(data)
    }

    #[test]
    fn test_decode_mp3_frames() {
        let audio = decode_audio(silent_mp3(20), Some("mp3")).unwrap();
        assert_eq!(audio.sample_rate, 44100);
        assert!(!audio.samples.is_empty());
        assert!(audio.samples.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn test_decode_mono_wav() {
        let audio = decode_audio(wav_clip(16000, 1, 1600), Some("wav")).unwrap();
        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.samples.len(), 1600);
        assert!((audio.duration_secs() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_decode_stereo_mixes_to_mono() {
        let audio = decode_audio(wav_clip(22050, 2, 2205), None).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.samples.len(), 2205);
    }

    #[test]
    fn test_garbage_is_playback_failure() {
        let err = decode_audio(Bytes::from_static(b"definitely not audio"), Some("mp3"))
            .unwrap_err();
        assert!(matches!(err, VoiceError::PlaybackFailure(_)));
    }

    #[test]
    fn test_mix_to_mono_averages_frames() {
        let mut out = Vec::new();
        mix_to_mono(&[1.0, 0.0, 0.5, 0.5], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5]);
    }
}
