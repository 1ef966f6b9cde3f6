use voicecast_core::{
    session::PRESET_TEST_TEXT,
    tts::mock::{MockBehavior, MockSynthesizer},
    ConvertOptions, SynthesisError, VoiceError, VoicePreset,
};


use fixture::Fixture;

#[tokio::test]
async fn test_convert_returns_payload_and_writes_identical_file() {
    let fixture = Fixture::new();
    let path = fixture.output_dir().join("hello.mp3");

    let artifact = fixture
        .session
        .engine()
        .convert("hello", ConvertOptions::new().output(&path))
        .await
        .unwrap();

    let audio = artifact.as_bytes().unwrap();
    assert_eq!(audio.len(), 100);
    assert_eq!(audio, &fixture.mock().payload());
    assert_eq!(std::fs::read(&path).unwrap(), audio.to_vec());
}

#[tokio::test]
async fn test_streamed_chunks_match_complete_audio() {
    let fixture = Fixture::with_synthesizer(MockSynthesizer::default().with_chunk_size(7));
    let engine = fixture.session.engine();

    let complete = engine
        .convert("hello", ConvertOptions::new())
        .await
        .unwrap();
    let streamed = engine
        .convert("hello", ConvertOptions::new().streaming(true))
        .await
        .unwrap()
        .into_stream()
        .unwrap()
        .collect_bytes()
        .await
        .unwrap();

    assert_eq!(complete.as_bytes().unwrap(), &streamed);
}

#[tokio::test]
async fn test_quick_convert_names_file_after_timestamp() {
    let fixture = Fixture::new();

    let conversion = fixture.session.quick_convert("Hello there").await.unwrap();

    let name = conversion.path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("tts_"), "unexpected name {name}");
    assert!(name.ends_with(".mp3"));
    assert_eq!(conversion.path.parent().unwrap(), fixture.output_dir());
    assert_eq!(std::fs::read(&conversion.path).unwrap(), conversion.audio.to_vec());
}

#[tokio::test]
async fn test_quick_convert_streaming_persists_all_chunks() {
    let fixture = Fixture::with_synthesizer(MockSynthesizer::default().with_chunk_size(9));

    let conversion = fixture
        .session
        .quick_convert_streaming("Hello there")
        .await
        .unwrap();

    assert_eq!(conversion.audio, fixture.mock().payload());
    assert_eq!(std::fs::read(&conversion.path).unwrap(), conversion.audio.to_vec());
    assert!(fixture.mock().captured_requests()[0].stream);
}

#[tokio::test]
async fn test_selected_voice_is_used() {
    let mut fixture = Fixture::new();
    fixture.session.set_voice("  custom-voice ").unwrap();

    fixture.session.quick_convert("Hi").await.unwrap();

    assert_eq!(fixture.session.current_voice(), "custom-voice");
    assert_eq!(fixture.mock().captured_requests()[0].voice_id, "custom-voice");
    assert!(matches!(
        fixture.session.set_voice("   "),
        Err(VoiceError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_batch_continues_past_empty_item() {
    let fixture = Fixture::new();
    let texts = vec![
        "First line".to_string(),
        "   ".to_string(),
        "Third line".to_string(),
    ];

    let mut seen = Vec::new();
    let report = fixture
        .session
        .batch_convert(&texts, |item| seen.push(item.index))
        .await;

    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.items[1].outcome,
        Err(VoiceError::InvalidInput(_))
    ));
    assert_eq!(fixture.saved_files().len(), 2);
    assert_eq!(fixture.mock().get_call_count(), 2);

    let names: Vec<String> = report
        .saved_paths()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(names[0].starts_with("batch_") && names[0].ends_with("_1.mp3"));
    assert!(names[1].starts_with("batch_") && names[1].ends_with("_3.mp3"));
}

#[tokio::test]
async fn test_batch_reports_service_failures() {
    let fixture = Fixture::with_mock_behavior(MockBehavior::Rejected {
        status: 400,
        body: "voice_not_found".to_string(),
    });
    let texts = vec!["one".to_string(), "two".to_string()];

    let report = fixture.session.batch_convert(&texts, |_| {}).await;

    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.failed(), 2);
    assert!(matches!(
        report.items[0].outcome,
        Err(VoiceError::SynthesisFailure(SynthesisError::Rejected { status: 400, .. }))
    ));
    assert!(fixture.saved_files().is_empty());
}

#[tokio::test]
async fn test_compare_presets_saves_one_file_per_preset() {
    let fixture = Fixture::new();

    let mut order = Vec::new();
    let results = fixture
        .session
        .compare_presets(PRESET_TEST_TEXT, |result| order.push(result.preset))
        .await;

    assert_eq!(
        order,
        vec![
            VoicePreset::HighSimilarity,
            VoicePreset::Balanced,
            VoicePreset::HighStability
        ]
    );
    assert!(results.iter().all(|r| r.outcome.is_ok()));

    let requests = fixture.mock().captured_requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].voice_settings.stability, 0.3);
    assert_eq!(requests[0].voice_settings.similarity_boost, 0.9);
    assert_eq!(requests[1].voice_settings.stability, 0.7);
    assert_eq!(requests[2].voice_settings.similarity_boost, 0.3);
    assert!(requests.iter().all(|r| r.text == PRESET_TEST_TEXT));

    let files = fixture.saved_files();
    assert_eq!(files.len(), 3);
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.starts_with("test_High_Similarity_")));
    assert!(names.iter().any(|n| n.starts_with("test_Balanced_")));
    assert!(names.iter().any(|n| n.starts_with("test_High_Stability_")));
}

#[tokio::test]
async fn test_compare_presets_attempts_every_preset() {
    let fixture = Fixture::with_mock_behavior(MockBehavior::AlwaysTransientError);

    let results = fixture.session.compare_presets("hello", |_| {}).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.outcome.is_err()));
    // one attempt plus three retries per preset
    assert_eq!(fixture.mock().get_call_count(), 12);
}
