//! In-memory files produced by drag-and-drop, file pickers and archives.

use bytes::Bytes;
use configurator_config::file_extension;

/// A named, typed in-memory file.
///
/// Names are basenames only; directory structure is never preserved.
#[derive(Clone, PartialEq, Eq)]
pub struct InMemoryFile {
    name: String,
    mime_type: String,
    bytes: Bytes,
}

impl std::fmt::Debug for InMemoryFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl InMemoryFile {
    /// Create a file, sniffing the MIME type from the extension.
    pub fn new(name: impl AsRef<str>, bytes: impl Into<Bytes>) -> Self {
        let name = basename(name.as_ref()).to_string();
        let mime_type = mime_for_name(&name).to_string();
        Self {
            name,
            mime_type,
            bytes: bytes.into(),
        }
    }

    /// Create a file with an explicit MIME type.
    pub fn with_mime(
        name: impl AsRef<str>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: basename(name.as_ref()).to_string(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// MIME type for a file name, by extension.
pub fn mime_for_name(name: &str) -> &'static str {
    match file_extension(name).as_deref() {
        Some("glb") => "model/gltf-binary",
        Some("gltf") => "model/gltf+json",
        Some("bin") => "application/octet-stream",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("ktx2") => "image/ktx2",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Last path component, accepting both `/` and `\` separators.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_flattened() {
        let file = InMemoryFile::new("textures/wood/Diffuse.PNG", vec![1, 2, 3]);
        assert_eq!(file.name(), "Diffuse.PNG");
        assert_eq!(file.mime_type(), "image/png");
        assert_eq!(file.len(), 3);
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("a/b/c.bin"), "c.bin");
        assert_eq!(basename(r"a\b\c.bin"), "c.bin");
        assert_eq!(basename("c.bin"), "c.bin");
        assert_eq!(basename("dir/"), "");
    }

    #[test]
    fn test_mime_sniffing() {
        assert_eq!(mime_for_name("car.glb"), "model/gltf-binary");
        assert_eq!(mime_for_name("car.gltf"), "model/gltf+json");
        assert_eq!(mime_for_name("photo.JPEG"), "image/jpeg");
        assert_eq!(mime_for_name("notes.txt"), "application/octet-stream");
    }
}
