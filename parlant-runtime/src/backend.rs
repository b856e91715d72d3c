use std::collections::BTreeMap;

use parlant_core::config::AppConfig;
use parlant_core::error::TranslatorError;
use parlant_core::types::{AudioPayload, LanguageCode, Translation};
use parlant_engine::traits::TranslationBackend;
use parlant_providers::parse::{parse_error_message, parse_language_catalog, parse_translation};
use parlant_providers::runtime::{self, HttpTimeouts};
use parlant_providers::translate::{build_languages_request, build_translate_request};

/// Talks to the translation backend over `/api/languages` and `/api/translate`.
#[derive(Debug, Clone)]
pub struct HttpTranslationBackend {
    base_url: String,
    timeouts: HttpTimeouts,
}

impl HttpTranslationBackend {
    pub fn new(base_url: impl Into<String>, timeouts: HttpTimeouts) -> Self {
        Self {
            base_url: base_url.into(),
            timeouts,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.backend_base_url.clone(),
            HttpTimeouts {
                connect: cfg.connect_timeout(),
                total: cfg.upload_timeout(),
            },
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl TranslationBackend for HttpTranslationBackend {
    async fn languages(&self) -> Result<BTreeMap<String, String>, TranslatorError> {
        let req = build_languages_request(&self.base_url);
        let resp = runtime::execute(&req, self.timeouts)
            .await
            .map_err(|e| TranslatorError::CatalogFetch(format!("{e:#}")))?;

        if !resp.is_success() {
            return Err(TranslatorError::CatalogFetch(format!(
                "status={}",
                resp.status
            )));
        }

        parse_language_catalog(&resp.body)
            .map_err(|e| TranslatorError::CatalogFetch(format!("{e:#}")))
    }

    async fn translate(
        &self,
        audio: &AudioPayload,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<Translation, TranslatorError> {
        let req = build_translate_request(&self.base_url, audio, source, target);
        log::debug!("translate request: {req:?}");

        let resp = runtime::execute(&req, self.timeouts).await.map_err(|e| {
            log::error!("translate request failed: {e:#}");
            TranslatorError::Upload(None)
        })?;

        if !resp.is_success() {
            let detail = parse_error_message(&resp.body);
            log::warn!(
                "translate failed: status={} error={:?}",
                resp.status,
                detail.as_deref().unwrap_or("<none>")
            );
            return Err(TranslatorError::Upload(detail));
        }

        parse_translation(&resp.body).map_err(|e| {
            log::error!("malformed translate response: {e:#}");
            TranslatorError::Upload(None)
        })
    }
}
