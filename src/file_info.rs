use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::{fs, io::AsyncReadExt};

/// Number of leading bytes inspected when classifying a file.
pub const SAMPLE_SIZE: usize = 1024;

/// How a file's bytes are presented to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    Text,
    Binary,
}

/// Classifies a byte sample as text when more than 80% of it is printable
/// ASCII or tab/newline/carriage return. Only the first [`SAMPLE_SIZE`]
/// bytes are considered. An empty sample has no printable majority and is
/// reported as binary.
pub fn detect(sample: &[u8]) -> ContentMode {
    let sample = &sample[..sample.len().min(SAMPLE_SIZE)];
    let printable = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == b'\t' || b == b'\n' || b == b'\r')
        .count();

    // printable / len > 0.8, kept in integers
    if printable * 10 > sample.len() * 8 {
        ContentMode::Text
    } else {
        ContentMode::Binary
    }
}

/// Reads up to [`SAMPLE_SIZE`] bytes from the start of `path`.
pub async fn read_sample(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path).await?;
    let mut buffer = Vec::with_capacity(SAMPLE_SIZE);
    file.take(SAMPLE_SIZE as u64).read_to_end(&mut buffer).await?;
    Ok(buffer)
}

/// A regular file about to be paged: its size and the mode it is shown in.
#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub mode: ContentMode,
}

impl FileInfo {
    /// Uses `requested` when given, otherwise samples the file.
    pub async fn new(
        path: PathBuf,
        size: u64,
        requested: Option<ContentMode>,
    ) -> Result<Self, std::io::Error> {
        let mode = match requested {
            Some(mode) => mode,
            None => {
                let sample = read_sample(&path).await?;
                let detected = detect(&sample);
                debug!("Sampled file: {:?}, size: {}, mode: {:?}", path, size, detected);
                detected
            }
        };

        Ok(Self { path, size, mode })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_bytes_are_binary() {
        assert_eq!(detect(&[0u8; 1024]), ContentMode::Binary);
    }

    #[test]
    fn repeated_letter_is_text() {
        assert_eq!(detect(&[b'a'; 1024]), ContentMode::Text);
    }

    #[test]
    fn threshold_sits_just_above_eighty_percent() {
        let mut sample = vec![0u8; 1024];
        sample[..820].fill(b'x');
        assert_eq!(detect(&sample), ContentMode::Text);

        let mut sample = vec![0u8; 1024];
        sample[..800].fill(b'x');
        assert_eq!(detect(&sample), ContentMode::Binary);
    }

    #[test]
    fn whitespace_controls_count_as_printable() {
        let sample = b"line one\r\n\tline two\n".repeat(20);
        assert_eq!(detect(&sample), ContentMode::Text);
    }

    #[test]
    fn only_the_first_kilobyte_is_sampled() {
        let mut sample = vec![b'a'; 1024];
        sample.extend(std::iter::repeat(0u8).take(4096));
        assert_eq!(detect(&sample), ContentMode::Text);
    }

    #[test]
    fn empty_sample_is_binary() {
        assert_eq!(detect(&[]), ContentMode::Binary);
    }

    #[tokio::test]
    async fn file_info_samples_leading_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello world\n").unwrap();

        let info = FileInfo::new(path.clone(), 12, None).await.unwrap();
        assert_eq!(info.path, path);
        assert_eq!(info.size, 12);
        assert_eq!(info.mode, ContentMode::Text);
    }

    #[tokio::test]
    async fn requested_mode_skips_sampling() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.txt");

        let info = FileInfo::new(missing, 0, Some(ContentMode::Binary)).await.unwrap();
        assert_eq!(info.mode, ContentMode::Binary);
    }
}
