use anyhow::{Context, anyhow};
use parlant_core::types::Translation;
use serde::Deserialize;
use std::collections::BTreeMap;

pub fn parse_language_catalog(body: &[u8]) -> anyhow::Result<BTreeMap<String, String>> {
    let map: BTreeMap<String, String> =
        serde_json::from_slice(body).context("decode languages JSON")?;
    if map.is_empty() {
        return Err(anyhow!("backend returned an empty language list"));
    }
    Ok(map)
}

pub fn parse_translation(body: &[u8]) -> anyhow::Result<Translation> {
    serde_json::from_slice(body).context("decode translation JSON")
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Extracts `{ "error": "..." }` from a failed response, if the body has one.
pub fn parse_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.trim().is_empty())
}
