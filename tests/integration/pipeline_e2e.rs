//! End-to-end pipeline tests with a scripted classifier.

use crate::helpers::{
    FakeSynth, RecordingBackend, RecordingSink, ScriptedModel, completion_body, fake_speech,
    http_pipeline, recording_pipeline,
};
use clarity::config::PlaybackMode;
use clarity::llm::RATE_LIMIT_REPLY;
use clarity::speech::SpeechRenderer;
use clarity::{ClarityError, SentimentLabel};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn negative_utterance_gets_empathetic_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("feeling sad or upset"))
        .and(body_string_contains("I lost my job today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "I'm so sorry about your job. That is a lot to carry.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = http_pipeline(ScriptedModel::negative(), &server.uri());
    let envelope = pipeline.respond("I lost my job today").await.unwrap();

    assert_eq!(envelope.sentiment, SentimentLabel::Negative);
    assert_eq!(
        envelope.reply,
        "I'm so sorry about your job. That is a lot to carry."
    );
    assert!(envelope.speak_note.is_none());
}

#[tokio::test]
async fn classifier_sees_normalized_text_and_prompt_sees_raw() {
    let model = ScriptedModel::positive();
    let backend = Arc::new(RecordingBackend::default());
    let pipeline = recording_pipeline(model.clone(), backend.clone());

    let envelope = pipeline
        .respond("  check out http://example.com #great @bob  ")
        .await
        .unwrap();

    assert_eq!(envelope.sentiment, SentimentLabel::Positive);
    assert_eq!(
        model.seen.lock().unwrap().as_slice(),
        ["check out  great".to_owned()]
    );
    let prompts = backend.prompts.lock().unwrap();
    assert!(prompts[0].contains("\"check out http://example.com #great @bob\""));
    assert!(prompts[0].contains("feeling happy or content"));
}

#[tokio::test]
async fn uncertain_classification_is_neutral() {
    let backend = Arc::new(RecordingBackend::default());
    let pipeline = recording_pipeline(ScriptedModel::with_logits(&[0.3, 0.1, 0.2]), backend.clone());

    let envelope = pipeline.respond("the bus was on time").await.unwrap();
    assert_eq!(envelope.sentiment, SentimentLabel::Neutral);
    assert!(backend.prompts.lock().unwrap()[0].contains("feeling okay or neutral"));
}

#[tokio::test]
async fn rate_limit_yields_apology_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let pipeline = http_pipeline(ScriptedModel::negative(), &server.uri());
    let envelope = pipeline.respond("nobody answers my calls").await.unwrap();

    assert_eq!(envelope.reply, RATE_LIMIT_REPLY);
    assert_eq!(envelope.sentiment, SentimentLabel::Negative);
}

#[tokio::test]
async fn backend_failure_is_reply_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let pipeline = http_pipeline(ScriptedModel::positive(), &server.uri());
    let envelope = pipeline.respond("I got the job!").await.unwrap();

    assert!(envelope.reply.starts_with("Something went wrong: "));
    assert!(envelope.reply.contains("upstream unavailable"));
    assert_eq!(envelope.sentiment, SentimentLabel::Positive);
}

#[tokio::test]
async fn empty_input_runs_nothing() {
    let model = ScriptedModel::negative();
    let backend = Arc::new(RecordingBackend::default());
    let pipeline = recording_pipeline(model.clone(), backend.clone());

    for input in ["", "   ", "\n\t"] {
        let err = pipeline.respond(input).await.unwrap_err();
        assert!(matches!(err, ClarityError::EmptyInput), "{input:?}");
    }
    assert_eq!(model.calls(), 0);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn classifier_failure_skips_generation() {
    let backend = Arc::new(RecordingBackend::default());
    let pipeline = recording_pipeline(ScriptedModel::failing(), backend.clone());

    let err = pipeline.respond("hello").await.unwrap_err();
    assert!(matches!(err, ClarityError::ModelInference(_)));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn mention_only_input_still_classified() {
    let model = ScriptedModel::with_logits(&[0.0, 2.0, 0.0]);
    let backend = Arc::new(RecordingBackend::default());
    let pipeline = recording_pipeline(model.clone(), backend.clone());

    let envelope = pipeline.respond("@bob").await.unwrap();
    assert_eq!(envelope.sentiment, SentimentLabel::Neutral);
    assert_eq!(model.seen.lock().unwrap().as_slice(), [String::new()]);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn speech_failure_keeps_reply() {
    let backend = Arc::new(RecordingBackend::default());
    let synth = FakeSynth::new(true);
    let sink = Arc::new(RecordingSink::default());
    let pipeline = recording_pipeline(ScriptedModel::negative(), backend)
        .with_speech(fake_speech(synth.clone(), sink));

    let envelope = pipeline.respond("I feel awful").await.unwrap();
    assert!(!envelope.reply.is_empty());
    let note = envelope.speak_note.unwrap();
    assert!(note.starts_with("Couldn't play audio: "));
    assert!(note.contains("overloaded"));
    assert_eq!(synth.calls(), 1);
}

#[tokio::test]
async fn successful_speech_adds_no_note() {
    let backend = Arc::new(RecordingBackend::default());
    let sink = Arc::new(RecordingSink::default());
    let pipeline = recording_pipeline(ScriptedModel::positive(), backend)
        .with_speech(fake_speech(FakeSynth::new(false), sink.clone()));

    let envelope = pipeline.respond("Best day ever").await.unwrap();
    assert!(envelope.speak_note.is_none());
    assert_eq!(sink.played.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn playback_failure_becomes_note() {
    let backend = Arc::new(RecordingBackend::default());
    let sink = Arc::new(RecordingSink {
        fail: true,
        ..RecordingSink::default()
    });
    let pipeline = recording_pipeline(ScriptedModel::positive(), backend)
        .with_speech(fake_speech(FakeSynth::new(false), sink));

    let envelope = pipeline.respond("Best day ever").await.unwrap();
    assert_eq!(envelope.sentiment, SentimentLabel::Positive);
    assert!(
        envelope
            .speak_note
            .unwrap()
            .contains("no default output device")
    );
}

#[tokio::test]
async fn detached_speech_is_drained_before_exit() {
    let backend = Arc::new(RecordingBackend::default());
    let sink = Arc::new(RecordingSink::default());
    let speech = SpeechRenderer::new(FakeSynth::new(false), sink.clone(), PlaybackMode::Detached);
    let pipeline = recording_pipeline(ScriptedModel::positive(), backend).with_speech(speech);

    let envelope = pipeline.respond("Best day ever").await.unwrap();
    assert!(envelope.speak_note.is_none());

    pipeline.drain_speech().await;
    let played = sink.played.lock().unwrap();
    assert_eq!(played.len(), 1);
    assert!(!played[0].exists());
}
