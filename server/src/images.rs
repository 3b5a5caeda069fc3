//! Inline image handling: avatars and recipe photos arrive as data URIs
//! (`data:image/png;base64,...`), get decoded and written below MEDIA_ROOT,
//! and are represented to clients as `/media/<relative path>` URLs.

use base64::Engine;
use std::env;
use std::path::PathBuf;
use uuid::Uuid;

pub const MEDIA_URL_PREFIX: &str = "/media";

#[derive(Debug, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

/// Parses a `data:<mime>;base64,<payload>` string. Only image mime types are
/// accepted.
pub fn parse_data_uri(input: &str) -> Result<DataUri, String> {
    let rest = input
        .strip_prefix("data:")
        .ok_or_else(|| "Expected a data URI.".to_string())?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| "Expected a base64-encoded data URI.".to_string())?;
    if !mime.starts_with("image/") {
        return Err(format!("Unsupported content type: {}", mime));
    }
    let data = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| "Invalid base64 image payload.".to_string())?;
    Ok(DataUri {
        mime: mime.to_string(),
        data,
    })
}

/// File extension for a declared image mime type: png and gif keep their own,
/// everything else is stored as jpg.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

pub fn media_root() -> PathBuf {
    PathBuf::from(env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()))
}

pub fn media_url(relative_path: &str) -> String {
    format!("{}/{}", MEDIA_URL_PREFIX, relative_path)
}

/// Decodes a data URI and stores it under `MEDIA_ROOT/<subdir>/` with a
/// generated unique filename. Returns the path relative to MEDIA_ROOT.
pub fn save_data_uri(subdir: &str, input: &str) -> Result<String, String> {
    let parsed = parse_data_uri(input)?;
    let filename = format!(
        "{}.{}",
        Uuid::new_v4(),
        extension_for_mime(&parsed.mime)
    );

    let dir = media_root().join(subdir);
    std::fs::create_dir_all(&dir).map_err(|e| format!("Failed to create media dir: {}", e))?;
    std::fs::write(dir.join(&filename), &parsed.data)
        .map_err(|e| format!("Failed to store image: {}", e))?;

    Ok(format!("{}/{}", subdir, filename))
}

/// Best-effort removal of a stored media file.
pub fn delete_media(relative_path: &str) {
    let path = media_root().join(relative_path);
    if let Err(e) = std::fs::remove_file(&path) {
        tracing::debug!("Failed to remove media file {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_B64: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_parse_png_data_uri() {
        let uri = format!("data:image/png;base64,{}", PNG_B64);
        let parsed = parse_data_uri(&uri).unwrap();
        assert_eq!(parsed.mime, "image/png");
        // PNG magic bytes
        assert_eq!(&parsed.data[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_parse_rejects_non_image() {
        let uri = "data:text/plain;base64,aGVsbG8=";
        assert!(parse_data_uri(uri).is_err());
    }

    #[test]
    fn test_parse_rejects_plain_string() {
        assert!(parse_data_uri("not a data uri").is_err());
        assert!(parse_data_uri("data:image/png,rawpayload").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        assert!(parse_data_uri("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_extension_inference() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/gif"), "gif");
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("image/webp"), "jpg");
    }

    #[test]
    fn test_media_url() {
        assert_eq!(
            media_url("users/avatars/x.png"),
            "/media/users/avatars/x.png"
        );
    }
}
