use parlant_core::types::{LanguageCode, Translation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STATUS_IDLE: &str = "Select languages and press Record";
pub const STATUS_RECORDING: &str = "Recording... Press Stop when finished.";
pub const STATUS_PROCESSING: &str = "Processing...";
pub const STATUS_DONE: &str = "Translation complete. Press Record to start again.";
pub const STATUS_UPLOAD_FAILED: &str = "Error occurred. Try again.";
pub const STATUS_MICROPHONE_DENIED: &str = "Microphone access denied.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Recording,
    Processing,
    Done,
    Error,
}

impl SessionStatus {
    // A stable label for UI display, not derived from `Debug`.
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Recording => "recording",
            SessionStatus::Processing => "processing",
            SessionStatus::Done => "done",
            SessionStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub source_lang: LanguageCode,
    pub target_lang: LanguageCode,
    pub status: SessionStatus,
    pub original_text: Option<String>,
    pub translated_text: Option<String>,
    pub error_message: Option<String>,
    pub status_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The microphone was acquired and capture is running.
    RecordingStarted,
    MicrophoneUnavailable { message: String },
    RecordingStopped,
    TranslationSucceeded(Translation),
    TranslationFailed { message: String },
    LanguagesSelected {
        source: LanguageCode,
        target: LanguageCode,
    },
    ReplayRequested,
}

/// Side effects the controller must perform, in order, after committing a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stop collecting, assemble the chunks and release the device.
    ReleaseCapture,
    SubmitTranslation {
        source: LanguageCode,
        target: LanguageCode,
    },
    Speak {
        text: String,
        language: LanguageCode,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("already recording")]
    AlreadyRecording,

    #[error("a translation is still in progress")]
    Busy,

    #[error("not recording")]
    NotRecording,

    #[error("no translation is in progress")]
    NotProcessing,

    #[error("auto-detect is only valid for the input language")]
    InvalidTarget,
}

impl Session {
    pub fn new(source_lang: LanguageCode, target_lang: LanguageCode) -> Self {
        Self {
            source_lang,
            target_lang,
            status: SessionStatus::Idle,
            original_text: None,
            translated_text: None,
            error_message: None,
            status_message: STATUS_IDLE.into(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.status == SessionStatus::Recording
    }

    /// Checked before the microphone is touched so a rejected start never acquires a device.
    pub fn can_start(&self) -> Result<(), TransitionError> {
        match self.status {
            SessionStatus::Idle | SessionStatus::Done | SessionStatus::Error => Ok(()),
            SessionStatus::Recording => Err(TransitionError::AlreadyRecording),
            SessionStatus::Processing => Err(TransitionError::Busy),
        }
    }

    pub fn apply(&self, event: SessionEvent) -> Result<Transition, TransitionError> {
        let mut next = self.clone();
        let mut effects = Vec::new();

        match event {
            SessionEvent::RecordingStarted => {
                self.can_start()?;
                next.clear_results();
                next.status = SessionStatus::Recording;
                next.status_message = STATUS_RECORDING.into();
            }
            SessionEvent::MicrophoneUnavailable { message } => {
                self.can_start()?;
                next.clear_results();
                next.status = SessionStatus::Error;
                next.error_message = Some(message);
                next.status_message = STATUS_MICROPHONE_DENIED.into();
            }
            SessionEvent::RecordingStopped => {
                if self.status != SessionStatus::Recording {
                    return Err(TransitionError::NotRecording);
                }
                next.status = SessionStatus::Processing;
                next.status_message = STATUS_PROCESSING.into();
                effects.push(Effect::ReleaseCapture);
                effects.push(Effect::SubmitTranslation {
                    source: self.source_lang.clone(),
                    target: self.target_lang.clone(),
                });
            }
            SessionEvent::TranslationSucceeded(t) => {
                self.require_processing()?;
                next.status = SessionStatus::Done;
                next.status_message = STATUS_DONE.into();
                next.error_message = None;
                effects.push(Effect::Speak {
                    text: t.translated.clone(),
                    language: self.target_lang.clone(),
                });
                next.original_text = Some(t.original);
                next.translated_text = Some(t.translated);
            }
            SessionEvent::TranslationFailed { message } => {
                self.require_processing()?;
                next.status = SessionStatus::Error;
                next.status_message = STATUS_UPLOAD_FAILED.into();
                next.error_message = Some(message);
            }
            SessionEvent::LanguagesSelected { source, target } => {
                if self.status == SessionStatus::Processing {
                    return Err(TransitionError::Busy);
                }
                if target.is_auto() {
                    return Err(TransitionError::InvalidTarget);
                }
                next.source_lang = source;
                next.target_lang = target;
            }
            SessionEvent::ReplayRequested => {
                if let Some(text) = self.replayable_text() {
                    effects.push(Effect::Speak {
                        text: text.to_string(),
                        language: self.target_lang.clone(),
                    });
                }
            }
        }

        Ok(Transition {
            session: next,
            effects,
        })
    }

    fn require_processing(&self) -> Result<(), TransitionError> {
        if self.status == SessionStatus::Processing {
            Ok(())
        } else {
            Err(TransitionError::NotProcessing)
        }
    }

    fn replayable_text(&self) -> Option<&str> {
        self.translated_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    fn clear_results(&mut self) {
        self.original_text = None;
        self.translated_text = None;
        self.error_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> Session {
        Session::new("en".into(), "fr".into())
    }

    fn step(s: &Session, e: SessionEvent) -> Session {
        s.apply(e).unwrap().session
    }

    fn translation(original: &str, translated: &str) -> Translation {
        Translation {
            original: original.into(),
            translated: translated.into(),
            detected_lang: None,
        }
    }

    #[test]
    fn stop_emits_release_then_submit_with_languages() {
        let rec = step(&idle(), SessionEvent::RecordingStarted);
        assert_eq!(rec.status, SessionStatus::Recording);

        let t = rec.apply(SessionEvent::RecordingStopped).unwrap();
        assert_eq!(t.session.status, SessionStatus::Processing);
        assert_eq!(t.session.status_message, STATUS_PROCESSING);
        assert_eq!(
            t.effects,
            vec![
                Effect::ReleaseCapture,
                Effect::SubmitTranslation {
                    source: "en".into(),
                    target: "fr".into(),
                },
            ]
        );
    }

    #[test]
    fn success_stores_texts_and_speaks_translation() {
        let processing = step(
            &step(&idle(), SessionEvent::RecordingStarted),
            SessionEvent::RecordingStopped,
        );
        let t = processing
            .apply(SessionEvent::TranslationSucceeded(translation("Bonjour", "Hello")))
            .unwrap();

        assert_eq!(t.session.status, SessionStatus::Done);
        assert_eq!(t.session.original_text.as_deref(), Some("Bonjour"));
        assert_eq!(t.session.translated_text.as_deref(), Some("Hello"));
        assert_eq!(
            t.effects,
            vec![Effect::Speak {
                text: "Hello".into(),
                language: "fr".into(),
            }]
        );
    }

    #[test]
    fn failure_sets_error_message() {
        let processing = step(
            &step(&idle(), SessionEvent::RecordingStarted),
            SessionEvent::RecordingStopped,
        );
        let s = step(
            &processing,
            SessionEvent::TranslationFailed {
                message: "Translation Error: X".into(),
            },
        );
        assert_eq!(s.status, SessionStatus::Error);
        assert_eq!(s.error_message.as_deref(), Some("Translation Error: X"));
        assert_eq!(s.status_message, STATUS_UPLOAD_FAILED);
    }

    #[test]
    fn restarting_clears_previous_results() {
        let mut done = idle();
        done.status = SessionStatus::Done;
        done.original_text = Some("Bonjour".into());
        done.translated_text = Some("Hello".into());

        let s = step(&done, SessionEvent::RecordingStarted);
        assert_eq!(s.status, SessionStatus::Recording);
        assert_eq!(s.original_text, None);
        assert_eq!(s.translated_text, None);

        let mut failed = idle();
        failed.status = SessionStatus::Error;
        failed.error_message = Some("boom".into());
        let s = step(&failed, SessionEvent::RecordingStarted);
        assert_eq!(s.error_message, None);
    }

    #[test]
    fn microphone_denial_moves_to_error_from_idle() {
        let s = step(
            &idle(),
            SessionEvent::MicrophoneUnavailable {
                message: "denied".into(),
            },
        );
        assert_eq!(s.status, SessionStatus::Error);
        assert_eq!(s.error_message.as_deref(), Some("denied"));
        assert_eq!(s.status_message, STATUS_MICROPHONE_DENIED);
    }

    #[test]
    fn start_is_rejected_while_recording_or_processing() {
        let rec = step(&idle(), SessionEvent::RecordingStarted);
        assert_eq!(
            rec.apply(SessionEvent::RecordingStarted).unwrap_err(),
            TransitionError::AlreadyRecording
        );

        let processing = step(&rec, SessionEvent::RecordingStopped);
        assert_eq!(processing.can_start().unwrap_err(), TransitionError::Busy);
        assert_eq!(
            processing
                .apply(SessionEvent::MicrophoneUnavailable {
                    message: "x".into()
                })
                .unwrap_err(),
            TransitionError::Busy
        );
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        assert_eq!(
            idle().apply(SessionEvent::RecordingStopped).unwrap_err(),
            TransitionError::NotRecording
        );
        assert_eq!(
            idle()
                .apply(SessionEvent::TranslationSucceeded(translation("a", "b")))
                .unwrap_err(),
            TransitionError::NotProcessing
        );
    }

    #[test]
    fn replay_without_translation_has_no_effects() {
        let t = idle().apply(SessionEvent::ReplayRequested).unwrap();
        assert!(t.effects.is_empty());

        let mut done = idle();
        done.status = SessionStatus::Done;
        done.translated_text = Some("".into());
        assert!(done.apply(SessionEvent::ReplayRequested).unwrap().effects.is_empty());
    }

    #[test]
    fn replay_uses_current_target_language() {
        let mut done = idle();
        done.status = SessionStatus::Done;
        done.translated_text = Some("Hola".into());
        let done = step(
            &done,
            SessionEvent::LanguagesSelected {
                source: "en".into(),
                target: "es".into(),
            },
        );

        let t = done.apply(SessionEvent::ReplayRequested).unwrap();
        assert_eq!(
            t.effects,
            vec![Effect::Speak {
                text: "Hola".into(),
                language: "es".into(),
            }]
        );
        assert_eq!(t.session, done);
    }

    #[test]
    fn language_selection_rules() {
        let s = step(
            &idle(),
            SessionEvent::LanguagesSelected {
                source: LanguageCode::auto(),
                target: "de".into(),
            },
        );
        assert!(s.source_lang.is_auto());

        assert_eq!(
            idle()
                .apply(SessionEvent::LanguagesSelected {
                    source: "en".into(),
                    target: LanguageCode::auto(),
                })
                .unwrap_err(),
            TransitionError::InvalidTarget
        );

        let processing = step(
            &step(&idle(), SessionEvent::RecordingStarted),
            SessionEvent::RecordingStopped,
        );
        assert_eq!(
            processing
                .apply(SessionEvent::LanguagesSelected {
                    source: "en".into(),
                    target: "de".into(),
                })
                .unwrap_err(),
            TransitionError::Busy
        );
    }
}
