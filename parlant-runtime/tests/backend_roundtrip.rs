use std::sync::{Arc, Mutex};
use std::time::Duration;

use parlant_core::config::AppConfig;
use parlant_core::error::{CATALOG_FALLBACK_WARNING, GENERIC_TRANSLATE_FAILURE};
use parlant_engine::controller::SessionController;
use parlant_engine::session::SessionStatus;
use parlant_engine::traits::{SpeechOutput, Voice};
use parlant_runtime::microphone::FileMicrophone;
use parlant_runtime::runtime_controller::build_controller;
use wiremock::matchers::{body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSpeech {
    spoken: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl SpeechOutput for RecordingSpeech {
    fn is_available(&self) -> bool {
        true
    }

    async fn voices(&self) -> Vec<Voice> {
        vec![]
    }

    async fn cancel(&self) {}

    async fn speak(&self, text: &str, tag: &str, _voice: Option<&Voice>) -> anyhow::Result<()> {
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), tag.to_string()));
        Ok(())
    }
}

struct Harness {
    controller: SessionController,
    speech: Arc<RecordingSpeech>,
    _dir: tempfile::TempDir,
}

fn harness(server: &MockServer, upload_timeout_secs: u64) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.webm");
    std::fs::write(&clip, b"fake-webm-bytes").unwrap();

    let cfg = AppConfig {
        backend_base_url: server.uri(),
        source_lang: "fr".into(),
        target_lang: "en".into(),
        upload_timeout_secs,
        ..AppConfig::default()
    };
    let speech = Arc::new(RecordingSpeech::default());
    let controller =
        build_controller(&cfg, Arc::new(FileMicrophone::new(clip)), speech.clone()).unwrap();
    Harness {
        controller,
        speech,
        _dir: dir,
    }
}

#[tokio::test]
async fn loads_catalog_from_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/languages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"en": "English", "ja": "Japanese"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, 30);
    let catalog = h.controller.load_catalog().await;
    assert_eq!(catalog.display_name(&"ja".into()), Some("Japanese"));
    assert!(!catalog.contains(&"de".into()));
    assert_eq!(h.controller.catalog_warning().await, None);
}

#[tokio::test]
async fn unreachable_catalog_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/languages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = harness(&server, 30);
    let catalog = h.controller.load_catalog().await;
    assert_eq!(catalog.len(), 4);
    assert!(catalog.contains(&"de".into()));
    assert_eq!(
        h.controller.catalog_warning().await.as_deref(),
        Some(CATALOG_FALLBACK_WARNING)
    );
}

#[tokio::test]
async fn records_uploads_once_and_speaks_translation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/translate"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"sourceLang\"\r\n\r\nfr\r\n"))
        .and(body_string_contains("name=\"targetLang\"\r\n\r\nen\r\n"))
        .and(body_string_contains("filename=\"recording.webm\""))
        .and(body_string_contains("fake-webm-bytes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "original": "Bonjour",
            "translated": "Hello",
            "detected_lang": "fr"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, 30);
    let s = h.controller.start_recording().await.unwrap();
    assert_eq!(s.status, SessionStatus::Recording);

    let s = h.controller.stop_recording().await.unwrap();
    assert_eq!(s.status, SessionStatus::Done);
    assert_eq!(s.original_text.as_deref(), Some("Bonjour"));
    assert_eq!(s.translated_text.as_deref(), Some("Hello"));
    assert_eq!(
        h.speech.spoken.lock().unwrap().clone(),
        vec![("Hello".to_string(), "en".to_string())]
    );
}

#[tokio::test]
async fn backend_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/translate"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "No audio file provided"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, 30);
    h.controller.start_recording().await.unwrap();
    let s = h.controller.stop_recording().await.unwrap();

    assert_eq!(s.status, SessionStatus::Error);
    assert_eq!(
        s.error_message.as_deref(),
        Some("Translation Error: No audio file provided")
    );
    assert!(h.speech.spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_json_failure_gets_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/translate"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let h = harness(&server, 30);
    h.controller.start_recording().await.unwrap();
    let s = h.controller.stop_recording().await.unwrap();

    assert_eq!(s.status, SessionStatus::Error);
    assert_eq!(
        s.error_message,
        Some(format!("Translation Error: {GENERIC_TRANSLATE_FAILURE}"))
    );
}

#[tokio::test]
async fn slow_backend_times_out_into_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/translate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"original": "a", "translated": "b"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let h = harness(&server, 1);
    h.controller.start_recording().await.unwrap();
    let s = h.controller.stop_recording().await.unwrap();

    assert_eq!(s.status, SessionStatus::Error);
    assert!(s.translated_text.is_none());

    // A fresh attempt is allowed after the failure.
    let s = h.controller.start_recording().await.unwrap();
    assert_eq!(s.status, SessionStatus::Recording);
    assert!(s.error_message.is_none());
    h.controller.shutdown().await;
}
