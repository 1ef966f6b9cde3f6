//! Conversion workflows behind the interactive menu: quick conversion,
//! batch conversion and the voice preset comparison.

use std::path::PathBuf;

use bytes::Bytes;
use chrono::Local;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{error, info};

use crate::error::{Result, VoiceError};
use crate::tts::{ConvertOptions, TtsEngine, VoiceSettings};

pub const PRESET_TEST_TEXT: &str = "This is a test of the voice quality with different settings.";

/// Fixed stability/similarity pairs compared by the voice quality test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum VoicePreset {
    #[strum(to_string = "High Similarity")]
    HighSimilarity,
    #[strum(to_string = "Balanced")]
    Balanced,
    #[strum(to_string = "High Stability")]
    HighStability,
}

impl VoicePreset {
    pub fn all() -> impl Iterator<Item = VoicePreset> {
        Self::iter()
    }

    pub fn stability(&self) -> f32 {
        match self {
            Self::HighSimilarity => 0.3,
            Self::Balanced => 0.7,
            Self::HighStability => 0.9,
        }
    }

    pub fn similarity_boost(&self) -> f32 {
        match self {
            Self::HighSimilarity => 0.9,
            Self::Balanced => 0.5,
            Self::HighStability => 0.3,
        }
    }

    /// Preset stability and similarity over the configured style and speaker boost
    pub fn voice_settings(&self, defaults: &VoiceSettings) -> VoiceSettings {
        VoiceSettings {
            stability: self.stability(),
            similarity_boost: self.similarity_boost(),
            ..defaults.clone()
        }
    }

    fn file_label(&self) -> String {
        self.to_string().replace(' ', "_")
    }
}

/// Which workflow produced a file; determines its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Quick,
    /// 1-based position in the batch
    Batch(usize),
    PresetTest(VoicePreset),
}

/// Local time formatted as `YYYYMMDD_HHMMSS`
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn output_file_name(kind: OutputKind, timestamp: &str, extension: &str) -> String {
    match kind {
        OutputKind::Quick => format!("tts_{timestamp}.{extension}"),
        OutputKind::Batch(index) => format!("batch_{timestamp}_{index}.{extension}"),
        OutputKind::PresetTest(preset) => {
            format!("test_{}_{timestamp}.{extension}", preset.file_label())
        }
    }
}

/// A saved conversion
#[derive(Debug, Clone)]
pub struct Conversion {
    pub path: PathBuf,
    pub audio: Bytes,
}

#[derive(Debug)]
pub struct BatchItem {
    /// 1-based position in the batch
    pub index: usize,
    pub text: String,
    pub outcome: Result<PathBuf>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn saved_paths(&self) -> Vec<&PathBuf> {
        self.items
            .iter()
            .filter_map(|item| item.outcome.as_ref().ok())
            .collect()
    }
}

#[derive(Debug)]
pub struct PresetResult {
    pub preset: VoicePreset,
    pub settings: VoiceSettings,
    pub outcome: Result<Conversion>,
}

/// One user's working state: the engine plus the currently selected voice
pub struct Session {
    engine: TtsEngine,
    current_voice: String,
}

impl Session {
    pub fn new(engine: TtsEngine) -> Self {
        let current_voice = engine.config().default_voice_id.clone();
        Self {
            engine,
            current_voice,
        }
    }

    pub fn engine(&self) -> &TtsEngine {
        &self.engine
    }

    pub fn current_voice(&self) -> &str {
        &self.current_voice
    }

    pub fn set_voice(&mut self, voice_id: impl Into<String>) -> Result<()> {
        let voice_id = voice_id.into();
        let voice_id = voice_id.trim();
        if voice_id.is_empty() {
            return Err(VoiceError::InvalidInput("Voice id cannot be empty".to_string()));
        }
        info!(voice_id, "Voice selected");
        self.current_voice = voice_id.to_string();
        Ok(())
    }

    pub fn output_path(&self, kind: OutputKind) -> PathBuf {
        let config = self.engine.config();
        config.output_dir.join(output_file_name(
            kind,
            &timestamp(),
            config.output_extension(),
        ))
    }

    /// Convert with the current voice and save under the output directory
    pub async fn quick_convert(&self, text: &str) -> Result<Conversion> {
        let path = self.output_path(OutputKind::Quick);
        let options = ConvertOptions::new()
            .voice(self.current_voice.clone())
            .output(path.clone());
        let audio = self.convert_complete(text, options).await?;
        Ok(Conversion { path, audio })
    }

    /// Like [`Session::quick_convert`], but streams the audio to disk as it
    /// arrives
    pub async fn quick_convert_streaming(&self, text: &str) -> Result<Conversion> {
        let path = self.output_path(OutputKind::Quick);
        let options = ConvertOptions::new()
            .voice(self.current_voice.clone())
            .streaming(true);

        let stream = self
            .engine
            .convert(text, options)
            .await?
            .into_stream()
            .ok_or_else(|| VoiceError::InvalidInput("Expected a streamed artifact".to_string()))?;
        let audio = stream.save_to(&path).await?;
        Ok(Conversion { path, audio })
    }

    /// Convert every text independently. A failed item is recorded and the
    /// batch moves on.
    pub async fn batch_convert<F>(&self, texts: &[String], mut on_item: F) -> BatchReport
    where
        F: FnMut(&BatchItem),
    {
        let mut report = BatchReport::default();

        for (i, text) in texts.iter().enumerate() {
            let index = i + 1;
            let path = self.output_path(OutputKind::Batch(index));
            let options = ConvertOptions::new()
                .voice(self.current_voice.clone())
                .output(path.clone());

            let outcome = self
                .convert_complete(text, options)
                .await
                .map(|_| path)
                .inspect_err(|e| error!("Batch convert failed for text {index}: {e}"));

            let item = BatchItem {
                index,
                text: text.clone(),
                outcome,
            };
            on_item(&item);
            report.items.push(item);
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch conversion complete"
        );
        report
    }

    pub async fn convert_with_preset(&self, preset: VoicePreset, text: &str) -> Result<Conversion> {
        let path = self.output_path(OutputKind::PresetTest(preset));
        let settings = preset.voice_settings(&self.engine.config().default_voice_settings());
        let options = ConvertOptions::new()
            .voice(self.current_voice.clone())
            .settings(settings)
            .output(path.clone());
        let audio = self.convert_complete(text, options).await?;
        Ok(Conversion { path, audio })
    }

    /// Run every preset over the same text. Each preset is attempted even if
    /// an earlier one failed.
    pub async fn compare_presets<F>(&self, text: &str, mut on_result: F) -> Vec<PresetResult>
    where
        F: FnMut(&PresetResult),
    {
        let defaults = self.engine.config().default_voice_settings();
        let mut results = Vec::new();

        for preset in VoicePreset::all() {
            let outcome = self
                .convert_with_preset(preset, text)
                .await
                .inspect_err(|e| error!("Voice test failed for {preset}: {e}"));
            let result = PresetResult {
                preset,
                settings: preset.voice_settings(&defaults),
                outcome,
            };
            on_result(&result);
            results.push(result);
        }

        results
    }

    async fn convert_complete(&self, text: &str, options: ConvertOptions) -> Result<Bytes> {
        let artifact = self.engine.convert(text, options).await?;
        artifact
            .as_bytes()
            .cloned()
            .ok_or_else(|| VoiceError::InvalidInput("Expected a complete artifact".to_string()))
    }
}
