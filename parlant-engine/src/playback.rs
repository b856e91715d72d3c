use crate::traits::{SpeechOutput, Voice};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyText,
    Unavailable,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// `voice` is `None` when the platform default for the language was used.
    Spoken { voice: Option<String> },
    Skipped(SkipReason),
}

/// Plays at most one utterance at a time. Failures are logged, never surfaced.
#[derive(Clone)]
pub struct Playback {
    output: Arc<dyn SpeechOutput>,
}

impl Playback {
    pub fn new(output: Arc<dyn SpeechOutput>) -> Self {
        Self { output }
    }

    pub async fn speak(&self, text: &str, language: &str) -> PlaybackOutcome {
        if text.trim().is_empty() {
            log::debug!("nothing to speak");
            return PlaybackOutcome::Skipped(SkipReason::EmptyText);
        }
        if !self.output.is_available() {
            log::warn!("Speech synthesis not supported; skipping playback");
            return PlaybackOutcome::Skipped(SkipReason::Unavailable);
        }

        // Voice lists may still be loading; use whatever is there right now.
        let voices = self.output.voices().await;
        let voice = select_voice(&voices, language);
        match voice {
            Some(v) => log::info!("Using voice: {} for lang: {language}", v.name),
            None => log::info!("No specific voice found for language {language}. Using default."),
        }

        self.output.cancel().await;
        match self.output.speak(text, language, voice).await {
            Ok(()) => PlaybackOutcome::Spoken {
                voice: voice.map(|v| v.name.clone()),
            },
            Err(e) => {
                log::warn!("speech playback failed: {e:#}");
                PlaybackOutcome::Skipped(SkipReason::Failed(e.to_string()))
            }
        }
    }
}

/// First voice whose language tag starts with `language`, ignoring case and `_` vs `-`.
pub fn select_voice<'a>(voices: &'a [Voice], language: &str) -> Option<&'a Voice> {
    let wanted = normalize_tag(language);
    if wanted.is_empty() {
        return None;
    }
    voices
        .iter()
        .find(|v| normalize_tag(&v.language_tag).starts_with(&wanted))
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, tag: &str) -> Voice {
        Voice {
            name: name.into(),
            language_tag: tag.into(),
        }
    }

    #[test]
    fn selects_by_prefix() {
        let voices = vec![voice("Alex", "en_US"), voice("Thomas", "fr_FR")];
        assert_eq!(select_voice(&voices, "fr").map(|v| v.name.as_str()), Some("Thomas"));
        assert_eq!(select_voice(&voices, "en-us").map(|v| v.name.as_str()), Some("Alex"));
    }

    #[test]
    fn region_specific_request_does_not_match_bare_tag() {
        let voices = vec![voice("Ting-Ting", "zh")];
        assert!(select_voice(&voices, "zh-cn").is_none());
    }

    #[test]
    fn no_voice_for_missing_or_empty_language() {
        let voices = vec![voice("Alex", "en_US")];
        assert!(select_voice(&voices, "ja").is_none());
        assert!(select_voice(&voices, "").is_none());
        assert!(select_voice(&[], "en").is_none());
    }
}
