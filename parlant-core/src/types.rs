use serde::{Deserialize, Serialize};
use std::fmt;

/// Source language value that lets the backend detect the spoken language.
pub const AUTO_DETECT: &str = "auto";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguageCode(pub String);

impl LanguageCode {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn auto() -> Self {
        Self(AUTO_DETECT.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_auto(&self) -> bool {
        self.0 == AUTO_DETECT
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub extension: String,
    pub mime_type: String,
}

impl AudioFormat {
    pub fn new(extension: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn wav() -> Self {
        Self::new("wav", "audio/wav")
    }

    /// Guess a format from a file extension; unknown extensions upload as opaque bytes.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        let mime = match ext.as_str() {
            "wav" => "audio/wav",
            "webm" => "audio/webm",
            "ogg" | "oga" => "audio/ogg",
            "mp3" => "audio/mpeg",
            "m4a" | "mp4" => "audio/mp4",
            "flac" => "audio/flac",
            _ => "application/octet-stream",
        };
        Self::new(ext, mime)
    }

    pub fn upload_filename(&self) -> String {
        format!("recording.{}", self.extension)
    }
}

/// One recording, assembled from the captured chunks.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub format: AudioFormat,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for AudioPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPayload")
            .field("format", &self.format)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

impl AudioPayload {
    pub fn from_chunks(format: AudioFormat, chunks: Vec<Vec<u8>>) -> Self {
        let len = chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(len);
        for chunk in chunks {
            bytes.extend_from_slice(&chunk);
        }
        Self { format, bytes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub original: String,
    pub translated: String,
    #[serde(default)]
    pub detected_lang: Option<String>,
}
