//! Non-interactive conversion driven entirely by command line flags

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use voicecast_core::session::OutputKind;
use voicecast_core::tts::save_audio;
use voicecast_core::{AudioManager, ConvertOptions, PlayOptions, Session};

use crate::formatter::Formatter;

#[derive(Debug, Clone)]
pub struct OneShot {
    pub text: String,
    pub output: Option<PathBuf>,
    pub stream: bool,
    pub play: bool,
    pub volume: f32,
}

pub async fn run_oneshot(session: &Session, audio: &AudioManager, job: OneShot) -> Result<()> {
    let formatter = Formatter::new();
    info!(stream = job.stream, play = job.play, "One-shot conversion");

    let path = match &job.output {
        Some(path) => path.clone(),
        None => session.output_path(OutputKind::Quick),
    };

    let options = ConvertOptions::new()
        .voice(session.current_voice())
        .streaming(job.stream);
    let artifact = session
        .engine()
        .convert(&job.text, options)
        .await
        .context("Conversion failed")?;

    if job.stream {
        let stream = artifact
            .into_stream()
            .context("Service returned complete audio for a streaming request")?;
        stream
            .save_to(&path)
            .await
            .with_context(|| format!("Failed to save audio to {}", path.display()))?;
    } else {
        let bytes = artifact
            .as_bytes()
            .context("Service returned a stream for a complete request")?;
        save_audio(bytes, &path)
            .await
            .with_context(|| format!("Failed to save audio to {}", path.display()))?;
    }
    formatter.print_success(&format!("Audio saved to: {}", path.display()));

    if job.play {
        audio
            .play(path.as_path(), PlayOptions::default().volume(job.volume))
            .await
            .context("Playback failed")?;
    }

    Ok(())
}
