use std::path::Path;

use log::{info, warn};
use tokio::fs;

use crate::error::{FileSystemError, NavigationError};
use crate::files::{FileBrowser, utils::metadata::MetadataConverter};
use crate::protocol::{DirectoryEntry, FileSystemReply, ServerMessage};

/// Lists `dir` with folders first, then files, each group by name.
/// Entries whose metadata cannot be read are left out.
pub async fn list_contents(dir: &Path) -> Result<Vec<DirectoryEntry>, FileSystemError> {
    let mut read_dir = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        // Entries we cannot stat are left out of the listing
        match fs::metadata(&path).await {
            Ok(metadata) => {
                let entry = MetadataConverter::to_directory_entry(&path, file_name, &metadata);
                entries.push(entry.await);
            }
            Err(e) => warn!("Failed to get metadata for {}: {}", file_name, e),
        }
    }

    sort_entries(&mut entries);
    Ok(entries)
}

pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
}

/// Moves the cursor to `target`. On any failure the cursor is left as it was.
pub async fn change_directory(
    browser: &mut FileBrowser,
    target: &str,
) -> Result<(), NavigationError> {
    let candidate = browser
        .path_resolver
        .resolve(&browser.state.current_dir, target)?;

    let metadata = fs::metadata(&candidate)
        .await
        .map_err(|source| NavigationError::NotFound {
            path: candidate.clone(),
            source,
        })?;
    if !metadata.is_dir() {
        return Err(NavigationError::NotADirectory(candidate));
    }

    info!("Changed directory to {:?}", candidate);
    browser.state.current_dir = candidate;
    Ok(())
}

pub async fn handle_get_contents(browser: &FileBrowser) -> ServerMessage {
    let dir = &browser.state.current_dir;
    info!("get_contents: {:?}", dir);

    match list_contents(dir).await {
        Ok(contents) => ServerMessage::FileSystem(FileSystemReply::Contents {
            path: browser.path_resolver.display(dir),
            contents,
        }),
        Err(e) => {
            warn!("Failed to list directory {:?}: {}", dir, e);
            ServerMessage::fs_error(format!("Failed to list directory: {}", e))
        }
    }
}

pub async fn handle_change_directory(browser: &mut FileBrowser, target: &str) -> ServerMessage {
    info!(
        "change_directory: {} (from {:?})",
        target, browser.state.current_dir
    );

    if let Err(e) = change_directory(browser, target).await {
        warn!("Failed to change directory to {}: {}", target, e);
        return ServerMessage::fs_error(format!("Failed to change directory: {}", e));
    }

    handle_get_contents(browser).await
}
