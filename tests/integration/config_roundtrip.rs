//! Config file round-trips through TOML.

use clarity::ClarityConfig;
use clarity::config::{AudioFormat, PlaybackMode, SecretRef};

#[test]
fn default_config_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    ClarityConfig::default().save_to_file(&path).unwrap();
    let loaded = ClarityConfig::from_file(&path).unwrap();

    let defaults = ClarityConfig::default();
    assert_eq!(loaded.classifier.model_id, defaults.classifier.model_id);
    assert_eq!(
        loaded.classifier.confidence_threshold,
        defaults.classifier.confidence_threshold
    );
    assert_eq!(loaded.llm.api_url, defaults.llm.api_url);
    assert_eq!(loaded.llm.api_key, defaults.llm.api_key);
    assert_eq!(loaded.server.port, 8000);
    assert!(loaded.validate().is_ok());
}

#[test]
fn hand_written_file_overrides_selected_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[classifier]
confidence_threshold = 0.7
model_variant = "q8"

[llm]
api_url = "http://localhost:11434"
api_model = "llama3.2"
api_key = { type = "none" }
temperature = 0.4

[speech]
playback = "detached"
format = "wav"
voice = "nova"

[server]
port = 9090
"#,
    )
    .unwrap();

    let config = ClarityConfig::load(Some(&path)).unwrap();
    assert_eq!(config.classifier.confidence_threshold, 0.7);
    assert_eq!(config.classifier.model_variant, "q8");
    assert_eq!(config.llm.api_key, SecretRef::None);
    assert_eq!(config.llm.temperature, Some(0.4));
    assert_eq!(config.speech.playback, PlaybackMode::Detached);
    assert_eq!(config.speech.format, AudioFormat::Wav);
    assert_eq!(config.speech.voice, "nova");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.host, "127.0.0.1");
    assert!(config.validate().is_ok());
}
