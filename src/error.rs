use std::path::PathBuf;

use thiserror::Error;

/// Failures of stat/read operations behind the file browser.
#[derive(Debug, Error)]
pub enum FileSystemError {
    #[error("Cannot read content of a directory")]
    IsDirectory,

    #[error("page size must be greater than zero")]
    ZeroPageSize,

    #[error("page size {requested} exceeds the limit of {limit} bytes")]
    PageTooLarge { requested: u64, limit: u64 },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Failures of `change_directory`. The cursor is never moved when one of these is returned.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("{}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("home directory not found")]
    NoHomeDirectory,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unrecognized message: {0}")]
    Unrecognized(String),
}

/// Client-side paging failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewerError {
    #[error("no file is open")]
    NoOpenFile,

    #[error("page {page} at offset {offset} overlaps or misorders the loaded pages")]
    OutOfOrder { page: u64, offset: u64 },

    #[error("reply mode does not match the open file")]
    ModeMismatch,
}
