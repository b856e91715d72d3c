use thiserror::Error;

pub const MICROPHONE_DENIED_MESSAGE: &str = "Could not access microphone. Please grant permission.";
pub const GENERIC_TRANSLATE_FAILURE: &str = "Failed to translate. Check server logs.";
pub const CATALOG_FALLBACK_WARNING: &str = "Could not load languages from server.";

/// Failures a user can see. Each maps to exactly one display message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslatorError {
    /// Permission denied or no input device; retry by starting again.
    #[error("microphone unavailable: {0}")]
    MicrophoneAccess(String),

    /// Network failure, timeout, non-2xx status or malformed body.
    /// The payload is the backend's `error` field when it sent one.
    #[error("upload failed: {}", .0.as_deref().unwrap_or("no details"))]
    Upload(Option<String>),

    /// Masked by the fallback catalog; never fatal.
    #[error("language list unavailable: {0}")]
    CatalogFetch(String),
}

impl TranslatorError {
    pub fn user_message(&self) -> String {
        match self {
            TranslatorError::MicrophoneAccess(_) => MICROPHONE_DENIED_MESSAGE.into(),
            TranslatorError::Upload(detail) => format!(
                "Translation Error: {}",
                detail
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or(GENERIC_TRANSLATE_FAILURE)
            ),
            TranslatorError::CatalogFetch(_) => CATALOG_FALLBACK_WARNING.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_message_prefers_backend_error() {
        let e = TranslatorError::Upload(Some("Could not understand audio".into()));
        assert_eq!(
            e.user_message(),
            "Translation Error: Could not understand audio"
        );
    }

    #[test]
    fn upload_message_falls_back_to_generic() {
        assert_eq!(
            TranslatorError::Upload(None).user_message(),
            "Translation Error: Failed to translate. Check server logs."
        );
        assert_eq!(
            TranslatorError::Upload(Some("  ".into())).user_message(),
            "Translation Error: Failed to translate. Check server logs."
        );
    }

    #[test]
    fn microphone_message_is_actionable() {
        let e = TranslatorError::MicrophoneAccess("NotAllowedError".into());
        assert!(e.user_message().contains("grant permission"));
        assert!(e.to_string().contains("NotAllowedError"));
    }
}
