use std::{io::Cursor, path::Path};

use bytes::Bytes;
use image::{ImageFormat, ImageReader};
use log::{debug, warn};

use crate::{constants::FALLBACK_MIME_TYPE, error::Result};

/// A user-chosen file, as the picker or a drop would hand it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    name: String,
    mime: String,
    bytes: Bytes,
}

/// What the preview pane shows for the selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub mime: String,
    /// `None` when the header could not be decoded.
    pub dimensions: Option<(u32, u32)>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads `path` and derives the MIME type from its extension, then from
    /// its content.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = Bytes::from(tokio::fs::read(path).await?);
        let mime = mime_from_path(path)
            .or_else(|| mime_from_bytes(&bytes))
            .unwrap_or(FALLBACK_MIME_TYPE);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        debug!("Loaded {} ({} bytes, {})", path.display(), bytes.len(), mime);

        Ok(Self::new(name, mime, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Reads the image header on a blocking thread to size the preview.
    pub async fn preview(&self) -> ImagePreview {
        let bytes = self.bytes.clone();
        let dimensions = match tokio::task::spawn_blocking(move || read_dimensions(&bytes)).await {
            Ok(Ok(dims)) => Some(dims),
            Ok(Err(e)) => {
                warn!("Could not decode preview for {}: {}", self.name, e);
                None
            }
            Err(e) => {
                warn!("Preview task for {} failed: {}", self.name, e);
                None
            }
        };

        ImagePreview {
            mime: self.mime.clone(),
            dimensions,
        }
    }
}

fn mime_from_path(path: &Path) -> Option<&'static str> {
    ImageFormat::from_path(path).ok().map(|f| f.to_mime_type())
}

fn mime_from_bytes(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

fn read_dimensions(bytes: &[u8]) -> image::ImageResult<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
}
