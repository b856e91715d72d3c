use crate::request::{Body, HttpRequest, join_url};
use parlant_core::types::{AudioPayload, LanguageCode};

pub const LANGUAGES_PATH: &str = "/api/languages";
pub const TRANSLATE_PATH: &str = "/api/translate";

pub fn build_languages_request(base_url: &str) -> HttpRequest {
    HttpRequest::get(join_url(base_url, LANGUAGES_PATH))
}

/// Multipart upload: `audio` file part plus `sourceLang` / `targetLang` fields.
pub fn build_translate_request(
    base_url: &str,
    audio: &AudioPayload,
    source: &LanguageCode,
    target: &LanguageCode,
) -> HttpRequest {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::new();

    append_file(
        &mut body,
        &boundary,
        "audio",
        &audio.format.upload_filename(),
        &audio.format.mime_type,
        &audio.bytes,
    );
    append_field(&mut body, &boundary, "sourceLang", source.as_str());
    append_field(&mut body, &boundary, "targetLang", target.as_str());

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    HttpRequest {
        method: "POST".into(),
        url: join_url(base_url, TRANSLATE_PATH),
        headers: vec![
            (
                "Content-Type".into(),
                format!("multipart/form-data; boundary={}", boundary),
            ),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::MultipartFormData {
            boundary,
            bytes: body,
        },
    }
}

fn append_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}
