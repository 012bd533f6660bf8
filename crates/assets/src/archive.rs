//! Archive expansion.
//!
//! Every non-directory entry of a zip archive becomes a flat, basename-only
//! [`InMemoryFile`]. Entries are decompressed as independent futures and
//! joined. Each future yields to the executor after every chunk, so entries
//! inflate interleaved and large archives do not hold the thread in one
//! burst. A broken container fails the whole expansion, a broken entry is
//! skipped and logged.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::task::Poll;

use bytes::Bytes;
use futures_util::future::{join_all, poll_fn};
use zip::ZipArchive;

use crate::error::IngestError;
use crate::file::{InMemoryFile, basename};

type ArchiveReader = ZipArchive<Cursor<Bytes>>;

/// Bytes inflated between two yields
const CHUNK_SIZE: usize = 64 * 1024;

/// Outcome of reading one archive entry
enum EntryOutcome {
    File(InMemoryFile),
    Skipped,
    Failed { index: usize, reason: String },
}

/// Expand a zip archive into flat in-memory files.
///
/// When two entries share a basename the one stored later in the archive
/// wins and a warning is logged.
pub async fn expand_archive(archive: &InMemoryFile) -> Result<Vec<InMemoryFile>, IngestError> {
    let reader = ZipArchive::new(Cursor::new(archive.bytes().clone())).map_err(|e| {
        IngestError::ArchiveCorrupt {
            name: archive.name().to_string(),
            reason: e.to_string(),
        }
    })?;

    let entry_count = reader.len();
    let outcomes = join_all((0..entry_count).map(|index| read_entry(reader.clone(), index))).await;

    let mut files: Vec<InMemoryFile> = Vec::with_capacity(entry_count);
    let mut positions: HashMap<String, usize> = HashMap::new();
    for outcome in outcomes {
        match outcome {
            EntryOutcome::File(file) => match positions.get(file.name()) {
                Some(&position) => {
                    tracing::warn!(
                        "Archive '{}' contains more than one '{}'; keeping the last one",
                        archive.name(),
                        file.name()
                    );
                    files[position] = file;
                }
                None => {
                    positions.insert(file.name().to_string(), files.len());
                    files.push(file);
                }
            },
            EntryOutcome::Skipped => {}
            EntryOutcome::Failed { index, reason } => {
                tracing::warn!(
                    "Skipping entry {} of archive '{}': {}",
                    index,
                    archive.name(),
                    reason
                );
            }
        }
    }

    tracing::info!(
        "Expanded archive '{}': {} files from {} entries",
        archive.name(),
        files.len(),
        entry_count
    );
    Ok(files)
}

async fn read_entry(mut reader: ArchiveReader, index: usize) -> EntryOutcome {
    let mut entry = match reader.by_index(index) {
        Ok(entry) => entry,
        Err(e) => {
            return EntryOutcome::Failed {
                index,
                reason: e.to_string(),
            };
        }
    };

    if entry.is_dir() {
        return EntryOutcome::Skipped;
    }

    let path = entry.name().to_string();
    let name = basename(&path);
    if name.is_empty() || is_resource_fork(&path) {
        return EntryOutcome::Skipped;
    }

    let mut buffer = Vec::with_capacity(entry.size().min(64 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        match entry.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => buffer.extend_from_slice(&chunk[..read]),
            Err(e) => {
                return EntryOutcome::Failed {
                    index,
                    reason: format!("{}: {}", path, e),
                };
            }
        }
        yield_now().await;
    }

    EntryOutcome::File(InMemoryFile::new(name, buffer))
}

/// Hand control back to the executor once.
async fn yield_now() {
    let mut yielded = false;
    poll_fn(|cx| {
        if yielded {
            return Poll::Ready(());
        }
        yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    })
    .await
}

/// macOS archivers add `__MACOSX/` trees and `._name` AppleDouble files.
fn is_resource_fork(path: &str) -> bool {
    path.starts_with("__MACOSX/") || path.contains("/__MACOSX/") || basename(path).starts_with("._")
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    /// Build a zip archive from `(path, contents)` pairs. Paths ending in `/`
    /// become directory entries.
    pub(crate) fn build_zip(name: &str, entries: &[(&str, &str)]) -> InMemoryFile {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (path, contents) in entries {
            if path.ends_with('/') {
                writer.add_directory(*path, options).unwrap();
            } else {
                writer.start_file(*path, options).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
        }
        let cursor = writer.finish().unwrap();
        InMemoryFile::new(name, cursor.into_inner())
    }

    #[tokio::test]
    async fn test_entries_are_flattened() {
        let archive = build_zip(
            "car.zip",
            &[
                ("car/", ""),
                ("car/model.gltf", "{}"),
                ("car/bin/model.bin", "BIN"),
                ("car/textures/diffuse.png", "PNG"),
            ],
        );

        let files = expand_archive(&archive).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["model.gltf", "model.bin", "diffuse.png"]);
        assert_eq!(files[1].bytes().as_ref(), b"BIN");
        assert_eq!(files[2].mime_type(), "image/png");
    }

    #[tokio::test]
    async fn test_duplicate_basename_last_wins() {
        let archive = build_zip(
            "dupes.zip",
            &[("a/logo.png", "first"), ("b/logo.png", "second")],
        );

        let files = expand_archive(&archive).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].bytes().as_ref(), b"second");
    }

    #[tokio::test]
    async fn test_resource_forks_are_skipped() {
        let archive = build_zip(
            "mac.zip",
            &[
                ("model.glb", "glTF"),
                ("__MACOSX/._model.glb", "junk"),
                ("._model.glb", "junk"),
            ],
        );

        let files = expand_archive(&archive).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].bytes().as_ref(), b"glTF");
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_skipped() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("good.bin", options).unwrap();
        writer.write_all(b"GOOD PAYLOAD").unwrap();
        writer.start_file("bad.bin", options).unwrap();
        writer.write_all(b"BAD PAYLOAD").unwrap();
        let mut bytes = writer.finish().unwrap().into_inner();

        // Flip a stored byte so the entry fails its checksum.
        let at = bytes
            .windows(b"BAD PAYLOAD".len())
            .position(|w| w == b"BAD PAYLOAD")
            .unwrap();
        bytes[at] ^= 0xff;

        let files = expand_archive(&InMemoryFile::new("mixed.zip", bytes)).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["good.bin"]);
        assert_eq!(files[0].bytes().as_ref(), b"GOOD PAYLOAD");
    }

    #[tokio::test]
    async fn test_large_entry_is_read_in_chunks() {
        let contents = "0123456789abcdef".repeat(CHUNK_SIZE / 4);
        let archive = build_zip("big.zip", &[("big.bin", contents.as_str()), ("small.txt", "hi")]);

        let files = expand_archive(&archive).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].bytes().len(), contents.len());
        assert_eq!(files[0].bytes().as_ref(), contents.as_bytes());
    }

    #[tokio::test]
    async fn test_corrupt_archive() {
        let archive = InMemoryFile::new("broken.zip", b"PK\x03\x04 definitely not a zip".to_vec());
        let err = expand_archive(&archive).await.unwrap_err();
        assert!(matches!(err, IngestError::ArchiveCorrupt { name, .. } if name == "broken.zip"));
    }
}
