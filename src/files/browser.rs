use std::path::{Path, PathBuf};

use crate::protocol::{FileSystemRequest, ServerMessage};
use crate::server::ServerConfig;

use super::{
    SessionState,
    handlers::{dir_ops, file_ops},
    utils::path_resolver::PathResolver,
};

/// The `file_system.*` side of one session: a directory cursor plus the
/// handlers that list, navigate and page through files relative to it.
pub struct FileBrowser {
    pub(crate) state: SessionState,
    pub(crate) path_resolver: PathResolver,
}

impl FileBrowser {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_state(
            config.start_dir.clone(),
            config.home_dir.clone(),
            config.max_page_size,
        )
    }

    pub fn with_state(start_dir: PathBuf, home_dir: Option<PathBuf>, max_page_size: u64) -> Self {
        Self {
            state: SessionState {
                current_dir: start_dir,
                max_page_size,
            },
            path_resolver: PathResolver::new(home_dir),
        }
    }

    pub fn current_dir(&self) -> &Path {
        &self.state.current_dir
    }

    /// Runs one request to completion. Failures come back as `error` replies.
    pub async fn handle(&mut self, request: FileSystemRequest) -> ServerMessage {
        match request {
            FileSystemRequest::GetContents => dir_ops::handle_get_contents(self).await,
            FileSystemRequest::ChangeDirectory { path } => {
                dir_ops::handle_change_directory(self, &path).await
            }
            FileSystemRequest::GetFileContent {
                filename,
                mode,
                pagesize,
            } => file_ops::handle_get_file_content(self, &filename, mode, pagesize).await,
            FileSystemRequest::GetFileChunk {
                filepath,
                mode,
                pagesize,
                byteoffset,
                aspage,
            } => {
                file_ops::handle_get_file_chunk(self, &filepath, mode, pagesize, byteoffset, aspage)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ContentMode, FileContent, FileSystemReply};

    #[tokio::test]
    async fn reads_are_relative_to_the_cursor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("logs")).unwrap();
        std::fs::write(dir.path().join("logs").join("app.log"), "x".repeat(1000)).unwrap();

        let mut browser = FileBrowser::with_state(dir.path().to_path_buf(), None, 4096);
        browser
            .handle(FileSystemRequest::ChangeDirectory {
                path: "logs".into(),
            })
            .await;

        let reply = browser
            .handle(FileSystemRequest::GetFileChunk {
                filepath: "app.log".into(),
                mode: ContentMode::Text,
                pagesize: 256,
                byteoffset: 768,
                aspage: 3,
            })
            .await;

        match reply {
            ServerMessage::FileSystem(FileSystemReply::FileContent(FileContent::Chunk(c))) => {
                assert_eq!(c.filename, "app.log");
                assert_eq!(c.size, 232);
                assert!(c.eof);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn directory_as_file_is_an_error_reply() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let mut browser = FileBrowser::with_state(dir.path().to_path_buf(), None, 4096);

        let reply = browser
            .handle(FileSystemRequest::GetFileContent {
                filename: "sub".into(),
                mode: None,
                pagesize: 256,
            })
            .await;
        assert_eq!(
            reply,
            ServerMessage::fs_error("Failed to read file: Cannot read content of a directory")
        );
    }
}
