//! `data:` URL encoding for images.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encode bytes as `data:<mime>;base64,<payload>`.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Check whether a string is a `data:` URL.
pub fn is_data_url(text: &str) -> bool {
    text.trim_start().starts_with("data:")
}

/// Decode a base64 `data:` URL.
pub fn decode(text: &str) -> Result<DataUrl, String> {
    let rest = text
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URL".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data URL has no payload".to_string())?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| "only base64 data URLs are supported".to_string())?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 payload: {}", e))?;

    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode("image/jpeg", b"abc"), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn test_decode() {
        let url = decode("data:image/png;base64,YWJj").unwrap();
        assert_eq!(url.mime_type, "image/png");
        assert_eq!(url.bytes, b"abc");
    }

    #[test]
    fn test_decode_errors() {
        assert!(decode("/files/front.png").is_err());
        assert!(decode("data:image/png;base64").is_err());
        assert!(decode("data:text/plain,hello").is_err());
        assert!(decode("data:image/png;base64,@@@").is_err());
    }
}
