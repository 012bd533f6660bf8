//! Validation of images uploaded as textures.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::error::TextureError;
use crate::file::InMemoryFile;

/// Image formats accepted as textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Png,
    Jpeg,
    WebP,
}

impl TextureFormat {
    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::WebP => ImageFormat::WebP,
        }
    }

    pub fn mime_type(self) -> &'static str {
        self.image_format().to_mime_type()
    }
}

/// An image that passed validation and can be minted for the viewer.
#[derive(Debug, Clone)]
pub struct TextureUpload {
    file: InMemoryFile,
    format: TextureFormat,
    width: u32,
    height: u32,
}

impl TextureUpload {
    /// Validate an uploaded file by its content.
    ///
    /// The format is sniffed from the bytes; a `.png` name on JPEG data is
    /// accepted and relabelled.
    pub fn from_file(file: InMemoryFile) -> Result<Self, TextureError> {
        if file.is_empty() {
            return Err(TextureError::Empty {
                name: file.name().to_string(),
            });
        }

        let format = image::guess_format(file.bytes())
            .ok()
            .and_then(TextureFormat::from_image_format)
            .ok_or_else(|| TextureError::UnsupportedFormat {
                name: file.name().to_string(),
            })?;

        let (width, height) =
            ImageReader::with_format(Cursor::new(file.bytes().as_ref()), format.image_format())
                .into_dimensions()
                .map_err(|e| TextureError::Corrupt {
                    name: file.name().to_string(),
                    reason: e.to_string(),
                })?;

        let file = if file.mime_type() == format.mime_type() {
            file
        } else {
            tracing::debug!(
                "Texture '{}' is {:?} despite its name",
                file.name(),
                format
            );
            InMemoryFile::with_mime(file.name(), format.mime_type(), file.bytes().clone())
        };

        tracing::info!(
            "Accepted {:?} texture '{}' ({}x{})",
            format,
            file.name(),
            width,
            height
        );
        Ok(Self {
            file,
            format,
            width,
            height,
        })
    }

    pub fn file(&self) -> &InMemoryFile {
        &self.file
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
