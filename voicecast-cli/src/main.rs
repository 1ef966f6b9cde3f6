use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use voicecast_core::{AudioManager, Config, Session, TtsEngine};

mod banner;
mod commands;
mod formatter;
mod interactive_app;
mod oneshot;

use crate::banner::{print_startup_banner, BannerInfo};
use crate::formatter::Formatter;
use crate::interactive_app::{AppOptions, InteractiveApp};
use crate::oneshot::{run_oneshot, OneShot};

#[derive(Parser, Debug)]
#[command(name = "voicecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Voicecast - ElevenLabs text-to-speech from the terminal")]
struct Args {
    /// Settings file (defaults to ~/.voicecast/settings.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Voice id to start with instead of the configured default
    #[arg(long, value_name = "ID")]
    voice: Option<String>,

    /// Directory for generated audio
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Convert this text and exit instead of starting the menu
    #[arg(long)]
    text: Option<String>,

    /// Where to write the one-shot conversion
    #[arg(long, value_name = "PATH", requires = "text")]
    output: Option<PathBuf>,

    /// Use the streaming endpoint
    #[arg(long)]
    stream: bool,

    /// Never play audio after converting
    #[arg(long)]
    no_play: bool,

    /// Playback volume between 0.0 and 1.0
    #[arg(long, default_value_t = 1.0)]
    volume: f32,
}

fn main() -> Result<()> {
    setup_tracing()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let local = tokio::task::LocalSet::new();
        local.run_until(async_main()).await
    })
}

async fn async_main() -> Result<()> {
    let args = Args::parse();

    info!(
        "CLI startup: config={:?}, voice={:?}, one_shot={}, stream={}, no_play={}",
        args.config,
        args.voice,
        args.text.is_some(),
        args.stream,
        args.no_play
    );

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e:#}");
            Formatter::new().print_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    };

    let config = Arc::new(config);
    let engine = TtsEngine::elevenlabs(config.clone())?;
    let mut session = Session::new(engine);
    if let Some(voice) = &args.voice {
        session.set_voice(voice.as_str())?;
    }

    let audio = AudioManager::default();
    let play = !args.no_play && cfg!(feature = "device");
    let volume = args.volume.clamp(0.0, 1.0);

    if let Some(text) = args.text {
        let job = OneShot {
            text,
            output: args.output,
            stream: args.stream,
            play,
            volume,
        };
        return run_oneshot(&session, &audio, job).await;
    }

    print_startup_banner(&BannerInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        voice_id: session.current_voice().to_string(),
        model_id: config.default_model_id.clone(),
        output_format: config.output_format.clone(),
        output_dir: config.output_dir.display().to_string(),
        playback: playback_disabled_reason(args.no_play),
    });

    let options = AppOptions {
        stream: args.stream,
        play,
        volume,
    };
    let mut app = InteractiveApp::new(session, audio, options)?;
    app.run().await
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    config
        .ensure_directories()
        .context("Failed to create output directories")?;
    Ok(config)
}

fn playback_disabled_reason(no_play: bool) -> Option<String> {
    if no_play {
        Some("--no-play".to_string())
    } else if !cfg!(feature = "device") {
        Some("built without the `device` feature".to_string())
    } else {
        None
    }
}

fn setup_tracing() -> Result<()> {
    use std::fs;
    use tracing_subscriber::fmt;

    // Create trace directory in user's home
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    let trace_dir = home.join(".voicecast").join("trace");
    fs::create_dir_all(&trace_dir)?;

    let log_file = trace_dir.join("voicecast.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Tracing initialized to {:?}", log_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_flags() {
        let args = Args::parse_from([
            "voicecast",
            "--text",
            "hello",
            "--output",
            "out.mp3",
            "--stream",
            "--no-play",
            "--volume",
            "0.4",
        ]);
        assert_eq!(args.text.as_deref(), Some("hello"));
        assert_eq!(args.output, Some(PathBuf::from("out.mp3")));
        assert!(args.stream);
        assert!(args.no_play);
        assert_eq!(args.volume, 0.4);
    }

    #[test]
    fn test_output_requires_text() {
        assert!(Args::try_parse_from(["voicecast", "--output", "out.mp3"]).is_err());
    }

    #[test]
    fn test_interactive_defaults() {
        let args = Args::parse_from(["voicecast"]);
        assert!(args.text.is_none());
        assert!(!args.no_play);
        assert_eq!(args.volume, 1.0);
        assert_eq!(playback_disabled_reason(true).as_deref(), Some("--no-play"));
    }
}
