use std::path::Path;

use log::{debug, info, warn};
use tokio::{
    fs,
    io::{AsyncReadExt, AsyncSeekExt},
};

use crate::error::FileSystemError;
use crate::file_info::{ContentMode, FileInfo};
use crate::files::FileBrowser;
use crate::protocol::{
    ChunkContent, FileContent, FileSystemReply, Page, PagedContent, ServerMessage,
};

/// Pages sent when a file view opens.
pub const INITIAL_PAGES: u64 = 3;

/// Opens `path` for reading, rejecting directories.
async fn open_regular(path: &Path) -> Result<(fs::File, u64), FileSystemError> {
    let metadata = fs::metadata(path).await?;
    if metadata.is_dir() {
        return Err(FileSystemError::IsDirectory);
    }
    let file = fs::File::open(path).await?;
    Ok((file, metadata.len()))
}

fn check_page_size(page_size: u64, limit: u64) -> Result<(), FileSystemError> {
    if page_size == 0 {
        return Err(FileSystemError::ZeroPageSize);
    }
    if page_size > limit {
        return Err(FileSystemError::PageTooLarge {
            requested: page_size,
            limit,
        });
    }
    Ok(())
}

async fn read_range(file: &mut fs::File, start: u64, end: u64) -> std::io::Result<Vec<u8>> {
    file.seek(std::io::SeekFrom::Start(start)).await?;
    let mut buffer = Vec::with_capacity(end.saturating_sub(start) as usize);
    (&mut *file).take(end.saturating_sub(start)).read_to_end(&mut buffer).await?;
    Ok(buffer)
}

/// Text is decoded as UTF-8 (invalid sequences replaced); binary becomes
/// space-separated upper-case hex pairs.
pub fn encode(bytes: &[u8], mode: ContentMode) -> String {
    match mode {
        ContentMode::Text => String::from_utf8_lossy(bytes).into_owned(),
        ContentMode::Binary => {
            let hex = hex::encode_upper(bytes);
            let mut out = String::with_capacity(bytes.len() * 3);
            for (i, pair) in hex.as_bytes().chunks(2).enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.extend(pair.iter().map(|&c| c as char));
            }
            out
        }
    }
}

/// Reads the opening pages of a file: the whole file as page 0 when it fits
/// in [`INITIAL_PAGES`] pages, otherwise exactly the first three pages.
pub async fn initial_load(
    path: &Path,
    filename: &str,
    mode: Option<ContentMode>,
    page_size: u64,
    max_page_size: u64,
) -> Result<PagedContent, FileSystemError> {
    check_page_size(page_size, max_page_size)?;
    let (mut file, size) = open_regular(path).await?;
    let info = FileInfo::new(path.to_path_buf(), size, mode).await?;
    let (file_size, mode) = (info.size, info.mode);

    // Small files go out whole as page 0
    let whole = file_size <= page_size.saturating_mul(INITIAL_PAGES);
    let page_count = if whole { 1 } else { INITIAL_PAGES };
    let mut pages = Vec::with_capacity(page_count as usize);

    for page_number in 0..page_count {
        let start = page_number * page_size;
        let end = if whole {
            file_size
        } else {
            (start + page_size).min(file_size)
        };
        let bytes = read_range(&mut file, start, end).await?;
        pages.push(Page {
            page_number,
            offset: start,
            content: encode(&bytes, mode),
            size: bytes.len() as u64,
        });
    }

    info!(
        "Initial load of {:?}: {} page(s), {} bytes total, mode {:?}",
        info.path,
        pages.len(),
        file_size,
        mode
    );

    Ok(PagedContent {
        filename: filename.to_string(),
        mode,
        eof: whole,
        sof: true,
        pages,
        total_size: file_size,
    })
}

/// Reads one page starting at the caller's `byte_offset`, clamped into the
/// file. `page_number` is echoed back and never used to compute the offset.
pub async fn chunk_read(
    path: &Path,
    filename: &str,
    mode: ContentMode,
    page_size: u64,
    byte_offset: u64,
    page_number: u64,
    max_page_size: u64,
) -> Result<ChunkContent, FileSystemError> {
    check_page_size(page_size, max_page_size)?;
    let (mut file, file_size) = open_regular(path).await?;

    if page_number.checked_mul(page_size) != Some(byte_offset) {
        debug!(
            "chunk offset {} differs from page {} x {}",
            byte_offset, page_number, page_size
        );
    }

    // Clamp into the file
    let actual_start = byte_offset.min(file_size.saturating_sub(1));
    let actual_end = actual_start.saturating_add(page_size).min(file_size);
    let bytes = read_range(&mut file, actual_start, actual_end).await?;

    info!(
        "read {:?}: page {}, offset {}, {} bytes of {}",
        path,
        page_number,
        actual_start,
        bytes.len(),
        file_size
    );

    Ok(ChunkContent {
        filename: filename.to_string(),
        mode,
        page: page_number,
        offset: actual_start,
        eof: actual_end >= file_size,
        sof: actual_start == 0,
        total_size: file_size,
        content: encode(&bytes, mode),
        size: bytes.len() as u64,
    })
}

pub async fn handle_get_file_content(
    browser: &FileBrowser,
    filename: &str,
    mode: Option<ContentMode>,
    page_size: u64,
) -> ServerMessage {
    info!("get_file_content: {} {:?} {}", filename, mode, page_size);

    let path = browser.state.current_dir.join(filename);
    match initial_load(&path, filename, mode, page_size, browser.state.max_page_size).await {
        Ok(content) => {
            ServerMessage::FileSystem(FileSystemReply::FileContent(FileContent::Pages(content)))
        }
        Err(e) => {
            warn!("Failed to read file {:?}: {}", path, e);
            ServerMessage::fs_error(format!("Failed to read file: {}", e))
        }
    }
}

pub async fn handle_get_file_chunk(
    browser: &FileBrowser,
    filepath: &str,
    mode: ContentMode,
    page_size: u64,
    byte_offset: u64,
    page_number: u64,
) -> ServerMessage {
    info!(
        "get_file_chunk: {} {:?} {} {} {}",
        filepath, mode, page_size, byte_offset, page_number
    );

    let path = browser.state.current_dir.join(filepath);
    let result = chunk_read(
        &path,
        filepath,
        mode,
        page_size,
        byte_offset,
        page_number,
        browser.state.max_page_size,
    )
    .await;

    match result {
        Ok(chunk) => {
            ServerMessage::FileSystem(FileSystemReply::FileContent(FileContent::Chunk(chunk)))
        }
        Err(e) => {
            warn!("Failed to read file chunk {:?}: {}", path, e);
            ServerMessage::fs_error(format!("Failed to read file chunk: {}", e))
        }
    }
}
