//! Local photo assets and content-type detection.

use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, warn};

/// One photo to upload. The payload is reference counted, so cloning an
/// asset for a retry does not copy the bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Asset {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, labelling it by extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .await
            .with_context(|| format!("Failed to read asset: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = detect_mime_type(path);
        debug!(file = %file_name, mime = content_type, size = data.len(), "Loaded asset");
        Ok(Self::new(file_name, content_type, Bytes::from(data)))
    }

    pub fn is_image(&self) -> bool {
        is_image(&self.content_type)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Load every path, keeping images and skipping everything else.
pub async fn collect_image_assets<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Asset>> {
    let mut assets = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        if !is_image(detect_mime_type(path)) {
            warn!(path = %path.display(), "Skipping non-image file");
            continue;
        }
        assets.push(Asset::from_path(path).await?);
    }
    Ok(assets)
}

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "webp"         => "image/webp",
        "gif"          => "image/gif",
        "heic"         => "image/heic",
        "heif"         => "image/heif",
        "avif"         => "image/avif",
        "bmp"          => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        _              => "application/octet-stream",
    }
}

pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Extension the backend gives the stored object for a content type.
pub fn storage_extension(content_type: &str) -> &'static str {
    if content_type.contains("png") {
        "png"
    } else if content_type.contains("webp") {
        "webp"
    } else {
        "jpg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_common_photo_types() {
        assert_eq!(detect_mime_type(&PathBuf::from("menu.JPG")), "image/jpeg");
        assert_eq!(detect_mime_type(&PathBuf::from("menu.heic")), "image/heic");
        assert_eq!(detect_mime_type(&PathBuf::from("notes.txt")), "application/octet-stream");
    }

    #[test]
    fn storage_extension_defaults_to_jpg() {
        assert_eq!(storage_extension("image/png"), "png");
        assert_eq!(storage_extension("image/webp"), "webp");
        assert_eq!(storage_extension("image/heic"), "jpg");
    }

    #[tokio::test]
    async fn collect_skips_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("page1.png");
        let notes = dir.path().join("notes.txt");
        std::fs::write(&photo, b"\x89PNG").unwrap();
        std::fs::write(&notes, b"hello").unwrap();

        let assets = collect_image_assets(&[photo, notes]).await.unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].file_name, "page1.png");
        assert_eq!(assets[0].content_type, "image/png");
        assert_eq!(assets[0].bytes.as_ref(), b"\x89PNG");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = Asset::from_path(Path::new("/definitely/not/here.jpg")).await;
        assert!(err.is_err());
    }
}
