use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use parlant_core::config::AppConfig;
use parlant_core::types::LanguageCode;
use parlant_engine::controller::{ControllerConfig, SessionController};
use parlant_engine::traits::{Microphone, SpeechOutput};

use crate::backend::HttpTranslationBackend;
use crate::microphone::{CpalMicrophone, FileMicrophone};
use crate::speech::{NullSpeech, SystemSpeech};

/// Where recordings come from.
#[derive(Debug, Clone, Default)]
pub enum AudioSource {
    #[default]
    System,
    File(PathBuf),
}

/// Builds a controller from config plus the given device adapters.
/// A configured target of `auto` is rejected.
pub fn build_controller(
    cfg: &AppConfig,
    microphone: Arc<dyn Microphone>,
    speech: Arc<dyn SpeechOutput>,
) -> anyhow::Result<SessionController> {
    let backend = Arc::new(HttpTranslationBackend::from_config(cfg));
    log::info!("translation backend: {}", backend.base_url());

    let controller_cfg = ControllerConfig {
        source_lang: LanguageCode::new(cfg.source_lang.clone()),
        target_lang: LanguageCode::new(cfg.target_lang.clone()),
        upload_timeout: cfg.upload_timeout(),
    };
    SessionController::new(controller_cfg, microphone, backend, speech).with_context(|| {
        format!(
            "invalid language pair {} -> {}",
            cfg.source_lang, cfg.target_lang
        )
    })
}

/// Same as `build_controller`, with the platform microphone and synthesizer.
pub async fn build_system_controller(
    cfg: &AppConfig,
    source: AudioSource,
    speech_enabled: bool,
) -> anyhow::Result<SessionController> {
    let microphone: Arc<dyn Microphone> = match source {
        AudioSource::System => Arc::new(CpalMicrophone::new(cfg.microphone_device.clone())),
        AudioSource::File(path) => {
            log::info!("using recording file: {}", path.display());
            Arc::new(FileMicrophone::new(path))
        }
    };

    let speech: Arc<dyn SpeechOutput> = if speech_enabled {
        Arc::new(SystemSpeech::detect().await)
    } else {
        Arc::new(NullSpeech)
    };

    build_controller(cfg, microphone, speech)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_for(source: &str, target: &str) -> anyhow::Result<SessionController> {
        let cfg = AppConfig {
            source_lang: source.into(),
            target_lang: target.into(),
            ..AppConfig::default()
        };
        build_controller(
            &cfg,
            Arc::new(FileMicrophone::new("clip.wav")),
            Arc::new(NullSpeech),
        )
    }

    #[test]
    fn configured_auto_target_is_rejected() {
        let Err(err) = controller_for("en", "auto") else {
            panic!("auto target accepted");
        };
        assert!(format!("{err:#}").contains("en -> auto"));
    }

    #[tokio::test]
    async fn configured_languages_seed_the_session() {
        let controller = controller_for("auto", "de").unwrap();
        let s = controller.snapshot().await;
        assert!(s.source_lang.is_auto());
        assert_eq!(s.target_lang.as_str(), "de");
    }
}
