//! Structured control messages carried on the session transport.
//!
//! Every structured frame is a JSON object tagged by `type` and, for the
//! file browser and host info, by `action`. The enums below are the
//! complete set; anything else is reported as unrecognized by the channel.

use serde::{Deserialize, Serialize};

pub use crate::file_info::ContentMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Resize { cols: u16, rows: u16 },
    FileSystem(FileSystemRequest),
    SystemInfo(SystemInfoRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FileSystemRequest {
    GetContents,
    ChangeDirectory {
        path: String,
    },
    /// Opens a file view. A missing `mode` is inferred from the file's first kilobyte.
    GetFileContent {
        filename: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<ContentMode>,
        pagesize: u64,
    },
    /// Fetches one page. `aspage` is the caller's bookkeeping key and is
    /// echoed back untouched; `byteoffset` alone decides what is read.
    GetFileChunk {
        filepath: String,
        mode: ContentMode,
        pagesize: u64,
        byteoffset: u64,
        aspage: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SystemInfoRequest {
    GetInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    FileSystem(FileSystemReply),
    SystemInfo(SystemInfoReply),
    /// Reply to a structured frame that matched none of the known kinds.
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FileSystemReply {
    Contents {
        path: String,
        contents: Vec<DirectoryEntry>,
    },
    FileContent(FileContent),
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SystemInfoReply {
    Info { data: serde_json::Value },
}

/// Both shapes of a `file_content` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileContent {
    Pages(PagedContent),
    Chunk(ChunkContent),
}

impl FileContent {
    pub fn filename(&self) -> &str {
        match self {
            FileContent::Pages(p) => &p.filename,
            FileContent::Chunk(c) => &c.filename,
        }
    }

    pub fn mode(&self) -> ContentMode {
        match self {
            FileContent::Pages(p) => p.mode,
            FileContent::Chunk(c) => c.mode,
        }
    }
}

/// Reply to `get_file_content`: the opening pages of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedContent {
    pub filename: String,
    pub mode: ContentMode,
    pub eof: bool,
    pub sof: bool,
    pub pages: Vec<Page>,
    #[serde(rename = "totalSize")]
    pub total_size: u64,
}

/// Reply to `get_file_chunk`: a single page, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkContent {
    pub filename: String,
    pub mode: ContentMode,
    pub page: u64,
    pub offset: u64,
    pub eof: bool,
    pub sof: bool,
    #[serde(rename = "totalSize")]
    pub total_size: u64,
    pub content: String,
    pub size: u64,
}

impl ChunkContent {
    pub fn to_page(&self) -> Page {
        Page {
            page_number: self.page,
            offset: self.offset,
            content: self.content.clone(),
            size: self.size,
        }
    }
}

/// One position-tagged slice of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "page")]
    pub page_number: u64,
    pub offset: u64,
    #[serde(rename = "text")]
    pub content: String,
    /// Raw byte length of the range this page was read from.
    pub size: u64,
}

impl Page {
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Folders order before files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub mime: String,
    /// Rounded size in kilobytes; always 0 for folders.
    #[serde(rename = "size")]
    pub size_kb: u64,
    #[serde(rename = "isBinary")]
    pub is_binary: bool,
}

impl ServerMessage {
    pub fn fs_error(message: impl Into<String>) -> Self {
        ServerMessage::FileSystem(FileSystemReply::Error {
            message: message.into(),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl ClientMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
