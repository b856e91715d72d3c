use crate::playback::{Playback, PlaybackOutcome, SkipReason};
use crate::session::{Effect, Session, SessionEvent, TransitionError};
use crate::traits::{CaptureStream, Microphone, SpeechOutput, TranslationBackend};
use parlant_core::catalog::LanguageCatalog;
use parlant_core::error::TranslatorError;
use parlant_core::types::{AudioPayload, LanguageCode, Translation};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Translator(#[from] TranslatorError),

    #[error("unknown language: {0}")]
    UnknownLanguage(LanguageCode),
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub source_lang: LanguageCode,
    pub target_lang: LanguageCode,
    pub upload_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            source_lang: "en".into(),
            target_lang: "fr".into(),
            upload_timeout: Duration::from_secs(30),
        }
    }
}

struct Inner {
    session: Session,
    capture: Option<Box<dyn CaptureStream>>,
    catalog: LanguageCatalog,
    catalog_warning: Option<String>,
}

pub struct SessionController {
    upload_timeout: Duration,
    microphone: Arc<dyn Microphone>,
    backend: Arc<dyn TranslationBackend>,
    playback: Playback,
    inner: Mutex<Inner>,
}

impl SessionController {
    /// Fails when the starting target is `auto`.
    pub fn new(
        cfg: ControllerConfig,
        microphone: Arc<dyn Microphone>,
        backend: Arc<dyn TranslationBackend>,
        speech: Arc<dyn SpeechOutput>,
    ) -> Result<Self, ControllerError> {
        if cfg.target_lang.is_auto() {
            return Err(TransitionError::InvalidTarget.into());
        }
        Ok(Self {
            upload_timeout: cfg.upload_timeout,
            microphone,
            backend,
            playback: Playback::new(speech),
            inner: Mutex::new(Inner {
                session: Session::new(cfg.source_lang, cfg.target_lang),
                capture: None,
                catalog: LanguageCatalog::default(),
                catalog_warning: None,
            }),
        })
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.lock().await.session.clone()
    }

    pub async fn catalog(&self) -> LanguageCatalog {
        self.inner.lock().await.catalog.clone()
    }

    pub async fn catalog_warning(&self) -> Option<String> {
        self.inner.lock().await.catalog_warning.clone()
    }

    /// Fetches the language list once. Failure is never fatal: the fallback set is used.
    pub async fn load_catalog(&self) -> LanguageCatalog {
        let fetched = self.backend.languages().await;

        let mut inner = self.inner.lock().await;
        match fetched {
            Ok(entries) => {
                inner.catalog = LanguageCatalog::new(entries);
                inner.catalog_warning = None;
                log::info!("loaded {} languages", inner.catalog.len());
            }
            Err(e) => {
                log::warn!("Error fetching languages, using fallback: {e}");
                inner.catalog = LanguageCatalog::fallback();
                inner.catalog_warning = Some(e.user_message());
            }
        }
        inner.catalog.clone()
    }

    /// Codes are checked against the catalog once one is loaded.
    pub async fn select_languages(
        &self,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<Session, ControllerError> {
        let mut inner = self.inner.lock().await;
        let t = inner.session.apply(SessionEvent::LanguagesSelected {
            source: source.clone(),
            target: target.clone(),
        })?;

        check_pair(&inner.catalog, &source, &target)?;

        commit(&mut inner, t.session);
        Ok(inner.session.clone())
    }

    /// Checks the current language pair against the loaded catalog.
    /// Meant to run right after `load_catalog`, before the first recording.
    pub async fn validate_languages(&self) -> Result<(), ControllerError> {
        let inner = self.inner.lock().await;
        check_pair(
            &inner.catalog,
            &inner.session.source_lang,
            &inner.session.target_lang,
        )
    }

    pub async fn start_recording(&self) -> Result<Session, ControllerError> {
        // A start while Processing must not even touch the device.
        self.inner.lock().await.session.can_start()?;

        // Unlocked: acquiring may wait on a permission prompt.
        let acquired = self.microphone.acquire().await;

        let mut inner = self.inner.lock().await;
        match acquired {
            Ok(mut capture) => {
                // Re-checked: another start may have won while we were acquiring.
                let t = match inner.session.apply(SessionEvent::RecordingStarted) {
                    Ok(t) => t,
                    Err(e) => {
                        capture.release();
                        return Err(e.into());
                    }
                };
                inner.capture = Some(capture);
                commit(&mut inner, t.session);
                Ok(inner.session.clone())
            }
            Err(e) => {
                log::error!("Error accessing microphone: {e:#}");
                let err = TranslatorError::MicrophoneAccess(format!("{e:#}"));
                let t = inner.session.apply(SessionEvent::MicrophoneUnavailable {
                    message: err.user_message(),
                })?;
                commit(&mut inner, t.session);
                Err(err.into())
            }
        }
    }

    pub async fn stop_recording(&self) -> Result<Session, ControllerError> {
        self.stop_recording_with_hook(|_session| {}).await
    }

    /// Same as `stop_recording`, but reports each intermediate session
    /// (Processing, then Done or Error). The hook must be fast.
    ///
    /// The future must be driven to completion: dropping it mid-upload leaves
    /// the session in Processing, and every later start fails with `Busy`.
    pub async fn stop_recording_with_hook<F>(
        &self,
        mut on_change: F,
    ) -> Result<Session, ControllerError>
    where
        F: FnMut(&Session) + Send,
    {
        let (t, mut capture) = {
            let mut inner = self.inner.lock().await;
            let t = inner.session.apply(SessionEvent::RecordingStopped)?;
            let capture = inner.capture.take();
            commit(&mut inner, t.session.clone());
            (t, capture)
        };
        on_change(&t.session);

        // The lock is not held while uploading so snapshots stay readable.
        let mut audio: Option<Result<AudioPayload, TranslatorError>> = None;
        let mut outcome: Option<Result<Translation, TranslatorError>> = None;
        for effect in t.effects {
            match effect {
                Effect::ReleaseCapture => audio = Some(drain_capture(capture.take()).await),
                Effect::SubmitTranslation { source, target } => {
                    outcome = Some(match audio.take() {
                        Some(Ok(payload)) => self.submit(&payload, &source, &target).await,
                        Some(Err(e)) => Err(e),
                        None => Err(TranslatorError::Upload(None)),
                    });
                }
                Effect::Speak { text, language } => {
                    self.playback.speak(&text, language.as_str()).await;
                }
            }
        }

        let event = match outcome.unwrap_or(Err(TranslatorError::Upload(None))) {
            Ok(translation) => {
                log::info!(
                    "translation complete (original_len={}, translated_len={})",
                    translation.original.len(),
                    translation.translated.len()
                );
                SessionEvent::TranslationSucceeded(translation)
            }
            Err(e) => {
                log::error!("Error uploading/translating: {e}");
                SessionEvent::TranslationFailed {
                    message: e.user_message(),
                }
            }
        };

        let t = {
            let mut inner = self.inner.lock().await;
            let t = inner.session.apply(event)?;
            commit(&mut inner, t.session.clone());
            t
        };
        on_change(&t.session);

        self.perform(&t.effects).await;
        Ok(t.session)
    }

    /// Speaks the last translation again. A no-op when there is nothing to say.
    pub async fn replay(&self) -> Result<PlaybackOutcome, ControllerError> {
        let t = {
            let inner = self.inner.lock().await;
            inner.session.apply(SessionEvent::ReplayRequested)?
        };
        Ok(self
            .perform(&t.effects)
            .await
            .unwrap_or(PlaybackOutcome::Skipped(SkipReason::EmptyText)))
    }

    /// Releases a capture that is still running, e.g. when the app quits mid-recording.
    /// The session itself is left as is.
    pub async fn shutdown(&self) {
        let capture = self.inner.lock().await.capture.take();
        if let Some(mut capture) = capture {
            log::info!("releasing microphone on shutdown");
            capture.release();
        }
    }

    async fn submit(
        &self,
        audio: &AudioPayload,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<Translation, TranslatorError> {
        log::info!(
            "uploading {} bytes ({} -> {})",
            audio.bytes.len(),
            source,
            target
        );
        match tokio::time::timeout(
            self.upload_timeout,
            self.backend.translate(audio, source, target),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                log::error!(
                    "translate request timed out after {}s",
                    self.upload_timeout.as_secs()
                );
                Err(TranslatorError::Upload(None))
            }
        }
    }

    async fn perform(&self, effects: &[Effect]) -> Option<PlaybackOutcome> {
        let mut last = None;
        for effect in effects {
            match effect {
                Effect::Speak { text, language } => {
                    last = Some(self.playback.speak(text, language.as_str()).await);
                }
                other => log::warn!("ignoring unexpected effect: {other:?}"),
            }
        }
        last
    }
}

/// An empty catalog means none was loaded yet; nothing is checked then.
fn check_pair(
    catalog: &LanguageCatalog,
    source: &LanguageCode,
    target: &LanguageCode,
) -> Result<(), ControllerError> {
    if catalog.is_empty() {
        return Ok(());
    }
    if !catalog.accepts_source(source) {
        return Err(ControllerError::UnknownLanguage(source.clone()));
    }
    if !catalog.accepts_target(target) {
        return Err(ControllerError::UnknownLanguage(target.clone()));
    }
    Ok(())
}

fn commit(inner: &mut Inner, next: Session) {
    let prev = inner.session.status;
    if prev != next.status {
        log::info!("session status: {:?} -> {:?}", prev, next.status);
    }
    inner.session = next;
}

/// Stops collecting and releases the device before anything else happens,
/// whether or not the audio could be read.
async fn drain_capture(
    capture: Option<Box<dyn CaptureStream>>,
) -> Result<AudioPayload, TranslatorError> {
    let Some(mut capture) = capture else {
        return Err(TranslatorError::Upload(Some("No recording in progress".into())));
    };

    let format = capture.format();
    let chunks = capture.finish().await;
    capture.release();

    let chunks = chunks.map_err(|e| {
        log::error!("failed to read captured audio: {e:#}");
        TranslatorError::Upload(Some("Could not read the recorded audio".into()))
    })?;
    Ok(AudioPayload::from_chunks(format, chunks))
}
