use std::process::Stdio;

use anyhow::{Context, anyhow};
use parlant_engine::traits::{SpeechOutput, Voice};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

/// Command-line speech synthesizers we know how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechCommand {
    /// macOS `say`.
    Say,
    /// `espeak-ng` (Linux and other Unix).
    EspeakNg,
}

impl SpeechCommand {
    pub fn for_platform() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::Say)
        } else if cfg!(unix) {
            Some(Self::EspeakNg)
        } else {
            None
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            Self::Say => "say",
            Self::EspeakNg => "espeak-ng",
        }
    }

    fn list_voices_args(self) -> &'static [&'static str] {
        match self {
            Self::Say => &["-v", "?"],
            Self::EspeakNg => &["--voices"],
        }
    }

    /// Text is always fed through stdin so it can't be mistaken for a flag.
    pub fn speak_args(self, language_tag: &str, voice: Option<&Voice>) -> Vec<String> {
        match self {
            Self::Say => match voice {
                Some(v) => vec!["-v".into(), v.name.clone()],
                None => vec![],
            },
            Self::EspeakNg => {
                let id = voice
                    .map(|v| v.language_tag.clone())
                    .unwrap_or_else(|| language_tag.to_string());
                let mut args = vec!["--stdin".to_string()];
                if !id.trim().is_empty() {
                    args.push("-v".into());
                    args.push(id);
                }
                args
            }
        }
    }

    pub fn parse_voices(self, listing: &str) -> Vec<Voice> {
        match self {
            Self::Say => parse_say_voices(listing),
            Self::EspeakNg => parse_espeak_voices(listing),
        }
    }
}

// `Alex                en_US    # Most people recognize me by my voice.`
fn parse_say_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim_end();
            let (name, tag) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || tag.is_empty() {
                return None;
            }
            Some(Voice {
                name: name.to_string(),
                language_tag: tag.to_string(),
            })
        })
        .collect()
}

// `Pty Language       Age/Gender VoiceName          File                 Other Languages`
// ` 5  af              --/M      Afrikaans          gmw/af`
fn parse_espeak_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return None;
            }
            Some(Voice {
                name: cols[3].to_string(),
                language_tag: cols[1].to_string(),
            })
        })
        .collect()
}

/// Speaks through the platform's command-line synthesizer.
pub struct SystemSpeech {
    command: Option<SpeechCommand>,
    voices: Mutex<Option<Vec<Voice>>>,
    current: Mutex<Option<Child>>,
}

impl SystemSpeech {
    pub fn new(command: Option<SpeechCommand>) -> Self {
        Self {
            command,
            voices: Mutex::new(None),
            current: Mutex::new(None),
        }
    }

    /// Probes the platform synthesizer; unavailable when the binary can't be run.
    pub async fn detect() -> Self {
        let Some(command) = SpeechCommand::for_platform() else {
            log::warn!("no speech synthesizer for this platform");
            return Self::new(None);
        };

        let speech = Self::new(Some(command));
        match speech.list_voices(command).await {
            Ok(voices) => {
                log::info!("Voices loaded: {}", voices.len());
                *speech.voices.lock().await = Some(voices);
                speech
            }
            Err(e) => {
                log::warn!("speech synthesizer `{}` unavailable: {e:#}", command.program());
                Self::new(None)
            }
        }
    }

    async fn list_voices(&self, command: SpeechCommand) -> anyhow::Result<Vec<Voice>> {
        let out = Command::new(command.program())
            .args(command.list_voices_args())
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("run {}", command.program()))?;
        if !out.status.success() {
            return Err(anyhow!(
                "{} exited with {}",
                command.program(),
                out.status
            ));
        }
        Ok(command.parse_voices(&String::from_utf8_lossy(&out.stdout)))
    }
}

#[async_trait::async_trait]
impl SpeechOutput for SystemSpeech {
    fn is_available(&self) -> bool {
        self.command.is_some()
    }

    async fn voices(&self) -> Vec<Voice> {
        self.voices.lock().await.clone().unwrap_or_default()
    }

    async fn cancel(&self) {
        let child = self.current.lock().await.take();
        if let Some(mut child) = child {
            if let Err(e) = child.kill().await {
                log::debug!("cancel utterance: {e}");
            }
        }
    }

    async fn speak(
        &self,
        text: &str,
        language_tag: &str,
        voice: Option<&Voice>,
    ) -> anyhow::Result<()> {
        let command = self
            .command
            .ok_or_else(|| anyhow!("speech synthesis not available"))?;

        let mut child = Command::new(command.program())
            .args(command.speak_args(language_tag, voice))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn {}", command.program()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .context("write utterance text")?;
            // Closing stdin starts playback.
        }

        // Fire and forget: the process keeps talking until done or cancelled.
        *self.current.lock().await = Some(child);
        Ok(())
    }
}

/// Used when playback is switched off.
#[derive(Debug, Default)]
pub struct NullSpeech;

#[async_trait::async_trait]
impl SpeechOutput for NullSpeech {
    fn is_available(&self) -> bool {
        false
    }

    async fn voices(&self) -> Vec<Voice> {
        vec![]
    }

    async fn cancel(&self) {}

    async fn speak(&self, _text: &str, _tag: &str, _voice: Option<&Voice>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_say_listing_with_spaced_names() {
        let listing = "Alex                en_US    # Most people recognize me by my voice.\n\
                       Bad News            en_US    # The light you see at the end of the tunnel\n\
                       Thomas              fr_FR    # Bonjour, je m'appelle Thomas.\n";
        let voices = SpeechCommand::Say.parse_voices(listing);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[1].name, "Bad News");
        assert_eq!(voices[2].language_tag, "fr_FR");
    }

    #[test]
    fn parses_espeak_listing_and_skips_header() {
        let listing = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
                       5  af              --/M      Afrikaans          gmw/af\n \
                       5  fr-fr           --/M      French_(France)    roa/fr               (fr 5)\n";
        let voices = SpeechCommand::EspeakNg.parse_voices(listing);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[1].language_tag, "fr-fr");
        assert_eq!(voices[1].name, "French_(France)");
    }

    #[test]
    fn speak_args_prefer_voice_then_language() {
        let v = Voice {
            name: "Thomas".into(),
            language_tag: "fr_FR".into(),
        };
        assert_eq!(SpeechCommand::Say.speak_args("fr", Some(&v)), vec!["-v", "Thomas"]);
        assert!(SpeechCommand::Say.speak_args("fr", None).is_empty());
        assert_eq!(
            SpeechCommand::EspeakNg.speak_args("de", None),
            vec!["--stdin", "-v", "de"]
        );
    }

    #[tokio::test]
    async fn unavailable_synthesizer_refuses_to_speak() {
        let speech = SystemSpeech::new(None);
        assert!(!speech.is_available());
        assert!(speech.speak("hello", "en", None).await.is_err());
        speech.cancel().await;
        assert!(speech.voices().await.is_empty());
    }
}
