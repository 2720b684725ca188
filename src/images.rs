use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

const IMAGE_DIR: &str = "recipes/images";
const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Decodes a `data:image/<ext>;base64,<payload>` string.
pub fn decode_data_url(data: &str) -> Result<DecodedImage, &'static str> {
    let rest = data
        .strip_prefix("data:image/")
        .ok_or("Upload a valid image encoded as a data URL.")?;
    let (extension, payload) = rest
        .split_once(";base64,")
        .ok_or("Upload a valid image encoded as a data URL.")?;
    let extension = extension.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err("Unsupported image format.");
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| "Image payload is not valid base64.")?;
    if bytes.is_empty() {
        return Err("The submitted image is empty.");
    }
    Ok(DecodedImage { extension, bytes })
}

/// Stores recipe images on the local filesystem under the media root.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the image and returns its path relative to the media root.
    pub async fn save(&self, image: &DecodedImage) -> Result<String> {
        let dir = self.root.join(IMAGE_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let name = format!("{}/{}.{}", IMAGE_DIR, uuid::Uuid::new_v4(), image.extension);
        let path = self.root.join(&name);
        tokio::fs::write(&path, &image.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!(image = %name, "stored recipe image");
        Ok(name)
    }

    /// Removes a stored image. Missing files are not an error.
    pub async fn delete(&self, name: &str) -> Result<()> {
        if name.is_empty() || name.contains("..") {
            return Ok(());
        }
        let path = self.root.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }

    /// Best-effort removal used after the owning transaction already settled.
    pub async fn release(&self, name: &str) {
        if let Err(e) = self.delete(name).await {
            tracing::warn!(image = %name, error = %e, "failed to release image");
        }
    }
}

pub fn image_url(name: &str) -> String {
    format!("/media/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_data_url() {
        let image = decode_data_url("data:image/PNG;base64,aGVsbG8=").unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(image.bytes, b"hello");
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(decode_data_url("aGVsbG8=").is_err());
        assert!(decode_data_url("data:image/png,aGVsbG8=").is_err());
        assert!(decode_data_url("data:image/tiff;base64,aGVsbG8=").is_err());
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
        assert!(decode_data_url("data:image/png;base64,").is_err());
    }

    #[tokio::test]
    async fn saves_and_deletes() {
        let root = std::env::temp_dir().join(format!("sogustika-images-{}", uuid::Uuid::new_v4()));
        let store = ImageStore::new(&root);
        let image = DecodedImage {
            extension: "png".to_owned(),
            bytes: vec![1, 2, 3],
        };

        let name = store.save(&image).await.unwrap();
        assert!(name.starts_with("recipes/images/"));
        assert!(name.ends_with(".png"));
        assert_eq!(tokio::fs::read(root.join(&name)).await.unwrap(), vec![1, 2, 3]);

        store.delete(&name).await.unwrap();
        assert!(!root.join(&name).exists());
        // deleting twice is fine
        store.delete(&name).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
