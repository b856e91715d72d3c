use async_trait::async_trait;
use parlant_core::error::TranslatorError;
use parlant_core::types::{AudioFormat, AudioPayload, LanguageCode, Translation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[async_trait]
pub trait Microphone: Send + Sync {
    /// May prompt for permission. Fails when access is denied or no device exists.
    async fn acquire(&self) -> anyhow::Result<Box<dyn CaptureStream>>;
}

/// An in-progress recording. Owned by the controller between start and stop.
#[async_trait]
pub trait CaptureStream: Send {
    fn format(&self) -> AudioFormat;

    /// Stops accepting audio and returns the chunks captured so far, in order.
    async fn finish(&mut self) -> anyhow::Result<Vec<Vec<u8>>>;

    /// Stops every underlying track. Must be idempotent.
    fn release(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub language_tag: String,
}

#[async_trait]
pub trait SpeechOutput: Send + Sync {
    fn is_available(&self) -> bool;

    /// The voices loaded right now. May be empty while the platform is still loading them.
    async fn voices(&self) -> Vec<Voice>;

    async fn cancel(&self);

    async fn speak(
        &self,
        text: &str,
        language_tag: &str,
        voice: Option<&Voice>,
    ) -> anyhow::Result<()>;
}

#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn languages(&self) -> Result<BTreeMap<String, String>, TranslatorError>;

    async fn translate(
        &self,
        audio: &AudioPayload,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<Translation, TranslatorError>;
}
