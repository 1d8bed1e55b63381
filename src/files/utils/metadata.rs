use std::path::Path;

use log::warn;

use crate::file_info::{self, ContentMode};
use crate::protocol::{DirectoryEntry, EntryKind};

pub struct MetadataConverter;

impl MetadataConverter {
    /// Builds the listing entry for `path`. Files are sampled so the client
    /// gets a text/binary hint; a sample that cannot be read counts as text.
    pub async fn to_directory_entry(
        path: &Path,
        name: String,
        metadata: &std::fs::Metadata,
    ) -> DirectoryEntry {
        if metadata.is_dir() {
            return DirectoryEntry {
                name,
                kind: EntryKind::Folder,
                mime: "unknown".to_string(),
                size_kb: 0,
                is_binary: false,
            };
        }

        let is_binary = match file_info::read_sample(path).await {
            Ok(sample) => file_info::detect(&sample) == ContentMode::Binary,
            Err(e) => {
                warn!("Failed to sample {:?} for binary detection: {}", path, e);
                false
            }
        };

        DirectoryEntry {
            name,
            kind: EntryKind::File,
            mime: Self::mime_type(path).to_string(),
            size_kb: Self::size_kb(metadata.len()),
            is_binary,
        }
    }

    pub fn mime_type(path: &Path) -> &'static str {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("txt") => "text/plain",
            Some("js") => "application/javascript",
            Some("json") => "application/json",
            Some("html") => "text/html",
            Some("css") => "text/css",
            Some("svg") => "image/svg+xml",
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("pdf") => "application/pdf",
            Some("zip") => "application/zip",
            Some("tar") => "application/x-tar",
            Some("gz") => "application/gzip",
            _ => "application/octet-stream",
        }
    }

    /// Kilobytes, rounded half up.
    pub fn size_kb(bytes: u64) -> u64 {
        (bytes + 512) / 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_lookup_ignores_case() {
        assert_eq!(MetadataConverter::mime_type(Path::new("A.JPG")), "image/jpeg");
        assert_eq!(MetadataConverter::mime_type(Path::new("x.tar")), "application/x-tar");
        assert_eq!(
            MetadataConverter::mime_type(Path::new("Makefile")),
            "application/octet-stream"
        );
    }

    #[test]
    fn size_rounds_to_nearest_kilobyte() {
        assert_eq!(MetadataConverter::size_kb(0), 0);
        assert_eq!(MetadataConverter::size_kb(511), 0);
        assert_eq!(MetadataConverter::size_kb(512), 1);
        assert_eq!(MetadataConverter::size_kb(2047), 2);
    }

    #[tokio::test]
    async fn entries_carry_binary_hint() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("readme.txt");
        let blob = dir.path().join("blob.dat");
        std::fs::write(&text, "plain words\n").unwrap();
        std::fs::write(&blob, [0u8, 1, 2, 3, 255, 254]).unwrap();

        let meta = std::fs::metadata(&text).unwrap();
        let entry = MetadataConverter::to_directory_entry(&text, "readme.txt".into(), &meta).await;
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.mime, "text/plain");
        assert!(!entry.is_binary);

        let meta = std::fs::metadata(&blob).unwrap();
        let entry = MetadataConverter::to_directory_entry(&blob, "blob.dat".into(), &meta).await;
        assert!(entry.is_binary);

        let meta = std::fs::metadata(dir.path()).unwrap();
        let entry = MetadataConverter::to_directory_entry(dir.path(), "d".into(), &meta).await;
        assert_eq!(entry.kind, EntryKind::Folder);
        assert_eq!(entry.size_kb, 0);
    }
}
