use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_base_url: String,
    pub source_lang: String,
    pub target_lang: String,

    // Upper bound on a translate round trip, so Processing always ends.
    pub upload_timeout_secs: u64,
    pub connect_timeout_secs: u64,

    // Preferred input device name; falls back to the system default.
    pub microphone_device: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_base_url: DEFAULT_BACKEND_BASE_URL.into(),
            source_lang: "en".into(),
            target_lang: "fr".into(),
            upload_timeout_secs: 30,
            connect_timeout_secs: 10,
            microphone_device: None,
        }
    }
}

impl AppConfig {
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}
