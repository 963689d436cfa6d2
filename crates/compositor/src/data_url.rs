//! Minimal `data:` URL decoding (`data:[<mime>][;base64],<payload>`).

use base64::Engine;

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type, `text/plain` when omitted.
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Errors from [`decode`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data: URL")]
    NotDataUrl,

    #[error("data: URL has no ',' separator")]
    MissingSeparator,

    #[error("invalid base64 payload: {0}")]
    Base64(String),

    #[error("invalid percent-encoded payload: {0}")]
    PercentEncoding(String),
}

const SCHEME: &str = "data:";

pub fn is_data_url(url: &str) -> bool {
    url.get(..SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(SCHEME))
}

pub fn decode(url: &str) -> Result<DataUrl, DataUrlError> {
    let rest = url
        .get(SCHEME.len()..)
        .filter(|_| is_data_url(url))
        .ok_or(DataUrlError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingSeparator)?;

    let mut params = header.split(';');
    let mime = params
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("text/plain")
        .to_ascii_lowercase();
    let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| DataUrlError::Base64(e.to_string()))?
    } else {
        urlencoding::decode(payload)
            .map_err(|e| DataUrlError::PercentEncoding(e.to_string()))?
            .into_owned()
            .into_bytes()
    };

    Ok(DataUrl { mime, bytes })
}
