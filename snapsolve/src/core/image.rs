//! Image payload encoding: raw frame bytes to and from `data:` URLs.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Content type assumed when a payload carries no type information.
pub const DEFAULT_MIME: &str = "image/jpeg";

/// Guess an image content type from its leading magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Encode raw image bytes as a base64 `data:` URL.
pub fn encode_data_url(bytes: &[u8]) -> String {
    let mime = sniff_mime(bytes).unwrap_or(DEFAULT_MIME);
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Accept either a full `data:` URL or bare base64 text and return a URL the
/// upstream model accepts. Remote `http(s)` URLs pass through unchanged.
pub fn normalize_image_payload(payload: &str) -> String {
    let trimmed = payload.trim();
    if trimmed.starts_with("data:") || trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        return trimmed.to_string();
    }
    let mime = BASE64
        .decode(trimmed.get(..trimmed.len().min(24) / 4 * 4).unwrap_or_default())
        .ok()
        .and_then(|head| sniff_mime(&head))
        .unwrap_or(DEFAULT_MIME);
    format!("data:{};base64,{}", mime, trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff_mime(JPEG_HEADER), Some("image/jpeg"));
        assert_eq!(sniff_mime(PNG_HEADER), Some("image/png"));
        assert_eq!(sniff_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime(b"hello"), None);
    }

    #[test]
    fn data_url_carries_sniffed_type() {
        let url = encode_data_url(PNG_HEADER);
        assert!(url.starts_with("data:image/png;base64,"));
        let encoded = url.trim_start_matches("data:image/png;base64,");
        assert_eq!(BASE64.decode(encoded).expect("decode"), PNG_HEADER);
    }

    #[test]
    fn unknown_bytes_default_to_jpeg() {
        assert!(encode_data_url(b"????").starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn bare_base64_is_wrapped_with_sniffed_type() {
        let bare = BASE64.encode(PNG_HEADER);
        assert_eq!(
            normalize_image_payload(&bare),
            format!("data:image/png;base64,{}", bare)
        );
    }

    #[test]
    fn urls_pass_through() {
        let url = "data:image/jpeg;base64,/9j/4AAQ";
        assert_eq!(normalize_image_payload(url), url);
        assert_eq!(
            normalize_image_payload(" https://example.com/p.png "),
            "https://example.com/p.png"
        );
    }
}
