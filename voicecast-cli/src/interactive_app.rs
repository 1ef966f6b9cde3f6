use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::signal;
use tracing::{error, info};
use voicecast_core::session::PRESET_TEST_TEXT;
use voicecast_core::{AudioManager, PlayOptions, Session, VoicePreset};

use crate::commands::{handle_local_command, parse_confirm, LocalCommandResult, MenuChoice};
use crate::formatter::Formatter;

/// Knobs the command line passes through to the menu loop
#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    pub stream: bool,
    pub play: bool,
    pub volume: f32,
}

pub struct InteractiveApp {
    session: Session,
    audio: AudioManager,
    formatter: Formatter,
    editor: DefaultEditor,
    options: AppOptions,
}

impl InteractiveApp {
    pub fn new(session: Session, audio: AudioManager, options: AppOptions) -> Result<Self> {
        let formatter = Formatter::new();
        formatter.print_system("💡 Pick an option by number, Ctrl-C or Ctrl-D to quit");

        Ok(Self {
            session,
            audio,
            formatter,
            editor: DefaultEditor::new()?,
            options,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.formatter.print_menu(self.session.current_voice());

            let prompt = self.formatter.print_prompt();
            let Some(line) = self.read_line(&prompt)? else {
                break;
            };

            let choice = match handle_local_command(&line) {
                LocalCommandResult::Selected(MenuChoice::Exit) => break,
                LocalCommandResult::Selected(choice) => choice,
                LocalCommandResult::Invalid { msg } => {
                    self.formatter.print_error(&msg);
                    continue;
                }
            };

            info!(?choice, "Menu option selected");
            if let Err(e) = self.dispatch(choice).await {
                error!("{choice:?} failed: {e:#}");
                self.formatter.print_error(&format!("{e:#}"));
            }
        }

        self.audio.stop();
        println!("\nThanks for using voicecast. Goodbye!");
        Ok(())
    }

    async fn dispatch(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::QuickConvert => self.quick_convert().await,
            MenuChoice::BatchConvert => self.batch_convert().await,
            MenuChoice::TestVoice => self.test_voice().await,
            MenuChoice::AccountStatus => self.account_status().await,
            MenuChoice::SelectVoice => self.select_voice().await,
            MenuChoice::Exit => Ok(()),
        }
    }

    async fn quick_convert(&mut self) -> Result<()> {
        println!("\n\x1b[1mQuick TTS\x1b[0m");
        let Some(text) = self.read_line("Enter text to convert: ")? else {
            return Ok(());
        };
        if text.trim().is_empty() {
            self.formatter.print_error("No text provided!");
            return Ok(());
        }

        let spinner = spinner("Converting text to speech...")?;
        let result = if self.options.stream {
            self.session.quick_convert_streaming(&text).await
        } else {
            self.session.quick_convert(&text).await
        };
        spinner.finish_and_clear();

        let conversion = result?;
        self.formatter
            .print_success(&format!("Audio saved to: {}", conversion.path.display()));

        if self.confirm("Play audio now? [Y/n] ", true)? {
            self.play(&conversion.path).await?;
        }
        Ok(())
    }

    async fn batch_convert(&mut self) -> Result<()> {
        println!("\n\x1b[1mBatch Text Conversion\x1b[0m");
        println!("Enter texts (empty line to finish):");

        let mut texts = Vec::new();
        loop {
            let prompt = format!("Text {}: ", texts.len() + 1);
            match self.read_line(&prompt)? {
                Some(text) if !text.trim().is_empty() => texts.push(text),
                _ => break,
            }
        }

        if texts.is_empty() {
            self.formatter.print_system("No texts provided");
            return Ok(());
        }

        println!("\nConverting {} texts...", texts.len());
        let progress = ProgressBar::new(texts.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        progress.enable_steady_tick(Duration::from_millis(100));

        let report = self
            .session
            .batch_convert(&texts, |item| {
                progress.inc(1);
                match &item.outcome {
                    Ok(path) => progress.set_message(format!("saved {}", file_name(path))),
                    Err(e) => progress.println(format!("\x1b[31m✗\x1b[0m Failed text {}: {e}", item.index)),
                }
            })
            .await;
        progress.finish_and_clear();

        for path in report.saved_paths() {
            println!("  {}", path.display());
        }
        self.formatter.print_success(&format!(
            "Batch conversion complete! {} saved, {} failed",
            report.succeeded(),
            report.failed()
        ));
        Ok(())
    }

    async fn test_voice(&mut self) -> Result<()> {
        println!("\n\x1b[1mVoice Quality Test\x1b[0m");
        println!("Using voice ID: {}", self.session.current_voice());

        for preset in VoicePreset::all() {
            println!("\n\x1b[36mTesting: {preset}\x1b[0m");

            let spinner = spinner("Generating sample...")?;
            let result = self.session.convert_with_preset(preset, PRESET_TEST_TEXT).await;
            spinner.finish_and_clear();

            match result {
                Ok(conversion) => {
                    println!("  Stability: {}", preset.stability());
                    println!("  Similarity: {}", preset.similarity_boost());
                    println!("  Saved to: {}", file_name(&conversion.path));

                    if self.confirm("  Play this version? [Y/n] ", true)? {
                        if let Err(e) = self.play(&conversion.path).await {
                            self.formatter.print_error(&format!("{e:#}"));
                        }
                    }
                }
                Err(e) => {
                    error!("Voice test failed for {preset}: {e}");
                    self.formatter.print_error(&format!("Test failed: {e}"));
                }
            }

            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        Ok(())
    }

    async fn account_status(&mut self) -> Result<()> {
        let spinner = spinner("Fetching account status...")?;
        let info = self.session.engine().get_account_status().await;
        spinner.finish_and_clear();

        self.formatter.print_account(&info);
        Ok(())
    }

    async fn select_voice(&mut self) -> Result<()> {
        let spinner = spinner("Fetching voices...")?;
        let voices = self.session.engine().list_voices().await;
        spinner.finish_and_clear();

        let voices = match voices {
            Ok(voices) => {
                self.formatter
                    .print_voices(&voices, self.session.current_voice());
                voices
            }
            Err(e) => {
                self.formatter
                    .print_error(&format!("Could not list voices: {e}"));
                Vec::new()
            }
        };

        let Some(input) = self.read_line("Voice number or id (empty to keep current): ")? else {
            return Ok(());
        };
        let input = input.trim();
        if input.is_empty() {
            return Ok(());
        }

        let voice_id = match input.parse::<usize>() {
            Ok(n) if (1..=voices.len()).contains(&n) => voices[n - 1].voice_id.clone(),
            _ => input.to_string(),
        };
        self.session.set_voice(voice_id)?;
        self.formatter.print_success(&format!(
            "Now using voice {}",
            self.session.current_voice()
        ));
        Ok(())
    }

    async fn play(&self, path: &Path) -> Result<()> {
        let options = PlayOptions::default().volume(self.options.volume);
        tokio::select! {
            result = self.audio.play(path, options) => {
                result?;
            }
            _ = signal::ctrl_c() => {
                self.audio.stop();
                self.formatter.print_system("Playback stopped");
            }
        }
        Ok(())
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        if !self.options.play {
            return Ok(false);
        }
        Ok(self
            .read_line(prompt)?
            .map(|answer| parse_confirm(&answer, default))
            .unwrap_or(false))
    }

    /// `None` when the user pressed Ctrl-C or closed input
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
