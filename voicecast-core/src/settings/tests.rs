use crate::error::VoiceError;
use crate::settings::config::{Config, DEFAULT_MODEL_ID, DEFAULT_VOICE_ID};
use crate::settings::loader::read_settings_file;
use rstest::rstest;
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_missing_api_key_is_configuration_error() {
    let err = Config::from_sources(None, env_from(&[])).unwrap_err();
    assert!(matches!(err, VoiceError::ConfigurationError(_)));
    assert!(err.to_string().contains("ELEVENLABS_API_KEY"));
}

#[test]
fn test_blank_api_key_is_rejected() {
    let err = Config::from_sources(None, env_from(&[("ELEVENLABS_API_KEY", "   ")])).unwrap_err();
    assert!(matches!(err, VoiceError::ConfigurationError(_)));
}

#[test]
fn test_defaults_with_only_api_key() {
    let config = Config::from_sources(None, env_from(&[("ELEVENLABS_API_KEY", "sk-test")])).unwrap();

    assert_eq!(config.api_key, "sk-test");
    assert_eq!(config.default_voice_id, DEFAULT_VOICE_ID);
    assert_eq!(config.default_model_id, DEFAULT_MODEL_ID);
    assert_eq!(config.output_format, "mp3_44100_128");
    assert_eq!(config.output_dir, PathBuf::from("./audio_outputs"));
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.voice_defaults.stability, 0.5);
    assert_eq!(config.voice_defaults.similarity_boost, 0.8);
    assert_eq!(config.voice_defaults.style, 0.0);
    assert!(config.voice_defaults.use_speaker_boost);
}

#[test]
fn test_environment_overrides_settings_file() {
    let file = r#"
api_key = "from-file"
default_voice_id = "file-voice"
max_retries = 7

[voice_defaults]
stability = 0.2
similarity_boost = 0.4
style = 0.1
use_speaker_boost = false
"#;
    let env = env_from(&[
        ("ELEVENLABS_API_KEY", "from-env"),
        ("OUTPUT_DIRECTORY", "/tmp/voicecast-out"),
        ("VOICECAST_API_BASE_URL", "http://localhost:9000/v1/"),
    ]);

    let config = Config::from_sources(Some(file), env).unwrap();

    assert_eq!(config.api_key, "from-env");
    assert_eq!(config.default_voice_id, "file-voice");
    assert_eq!(config.max_retries, 7);
    assert_eq!(config.output_dir, PathBuf::from("/tmp/voicecast-out"));
    assert_eq!(config.api_base_url, "http://localhost:9000/v1");
    assert_eq!(config.voice_defaults.stability, 0.2);
    assert!(!config.voice_defaults.use_speaker_boost);
}

#[rstest]
#[case("VOICECAST_REQUEST_TIMEOUT", "soon")]
#[case("VOICECAST_MAX_RETRIES", "-1")]
#[case("VOICECAST_REQUEST_TIMEOUT", "0")]
fn test_invalid_numeric_env(#[case] key: &str, #[case] value: &str) {
    let env = env_from(&[("ELEVENLABS_API_KEY", "sk-test"), (key, value)]);
    let err = Config::from_sources(None, env).unwrap_err();
    assert!(matches!(err, VoiceError::ConfigurationError(_)));
}

#[test]
fn test_out_of_range_voice_default() {
    let file = r#"
api_key = "k"

[voice_defaults]
stability = 1.5
"#;
    let err = Config::from_sources(Some(file), env_from(&[])).unwrap_err();
    assert!(err.to_string().contains("stability"));
}

#[test]
fn test_malformed_settings_file() {
    let err = Config::from_sources(Some("api_key = "), env_from(&[])).unwrap_err();
    assert!(matches!(err, VoiceError::ConfigurationError(_)));
}

#[rstest]
#[case("mp3_44100_128", "mp3")]
#[case("pcm_16000", "pcm")]
#[case("ulaw_8000", "ulaw")]
#[case("opus_48000_64", "opus")]
fn test_output_extension(#[case] format: &str, #[case] expected: &str) {
    let config = Config {
        output_format: format.to_string(),
        ..Config::default()
    };
    assert_eq!(config.output_extension(), expected);
}

#[test]
fn test_debug_redacts_api_key() {
    let config = Config {
        api_key: "sk-super-secret".to_string(),
        ..Config::default()
    };
    let debug = format!("{config:?}");
    assert!(!debug.contains("sk-super-secret"));
    assert!(debug.contains("<redacted>"));
}

#[test]
fn test_ensure_directories_creates_both() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        api_key: "k".to_string(),
        output_dir: temp_dir.path().join("out/nested"),
        voice_samples_dir: temp_dir.path().join("samples"),
        ..Config::default()
    };

    config.ensure_directories().unwrap();

    assert!(config.output_dir.is_dir());
    assert!(config.voice_samples_dir.is_dir());
}

#[test]
fn test_missing_settings_file_is_configuration_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = read_settings_file(&temp_dir.path().join("nope.toml")).unwrap_err();
    match err {
        VoiceError::ConfigurationError(msg) => assert!(msg.contains("nope.toml")),
        other => panic!("unexpected error: {other:?}"),
    }
}
