use std::collections::BTreeMap;

use log::debug;

use crate::error::ViewerError;
use crate::file_info::ContentMode;
use crate::protocol::{ClientMessage, FileContent, FileSystemRequest, Page};

use super::page_size::{ContentArea, page_size_for_viewport};

/// Client-side state of one open file viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileViewState {
    pub filename: String,
    pub mode: ContentMode,
    /// Fixed for the lifetime of the state; a change goes through
    /// [`PageCache::invalidate`].
    pub page_size: u64,
    pub total_size: u64,
    pub loaded_pages: BTreeMap<u64, Page>,
    pub eof: bool,
    pub sof: bool,
}

impl FileViewState {
    fn new(filename: String, mode: ContentMode, page_size: u64) -> Self {
        Self {
            filename,
            mode,
            page_size,
            total_size: 0,
            loaded_pages: BTreeMap::new(),
            eof: false,
            sof: false,
        }
    }

    pub fn first_page(&self) -> Option<u64> {
        self.loaded_pages.keys().next().copied()
    }

    pub fn last_page(&self) -> Option<u64> {
        self.loaded_pages.keys().next_back().copied()
    }

    fn refresh_flags(&mut self) {
        self.sof = self.loaded_pages.values().any(|p| p.offset == 0);
        self.eof = self
            .loaded_pages
            .values()
            .any(|p| p.end() >= self.total_size);
    }
}

/// Page store for the single open file view.
///
/// Pages are keyed by page number and may arrive in any order; a repeated
/// page number overwrites the earlier copy. Boundary flags are derived from
/// the pages actually held.
#[derive(Debug, Default)]
pub struct PageCache {
    state: Option<FileViewState>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&FileViewState> {
        self.state.as_ref()
    }

    /// Starts a fresh view of `filename`, dropping whatever was open, and
    /// returns the opening request.
    pub fn open(&mut self, filename: &str, mode: ContentMode, page_size: u64) -> ClientMessage {
        debug!("open {} as {:?} with page size {}", filename, mode, page_size);
        self.state = Some(FileViewState::new(filename.to_string(), mode, page_size));
        ClientMessage::FileSystem(FileSystemRequest::GetFileContent {
            filename: filename.to_string(),
            mode: Some(mode),
            pagesize: page_size,
        })
    }

    pub fn close(&mut self) {
        self.state = None;
    }

    /// Feeds a `file_content` reply. Returns `Ok(false)` when the reply
    /// belongs to a file that is no longer open.
    pub fn on_file_content(&mut self, reply: FileContent) -> Result<bool, ViewerError> {
        let state = self.state.as_ref().ok_or(ViewerError::NoOpenFile)?;
        if reply.filename() != state.filename {
            debug!("ignoring stale reply for {}", reply.filename());
            return Ok(false);
        }
        if reply.mode() != state.mode {
            return Err(ViewerError::ModeMismatch);
        }

        match reply {
            FileContent::Pages(content) => {
                self.on_pages_received(content.pages, content.total_size, content.eof, content.sof)?
            }
            FileContent::Chunk(chunk) => {
                let page = chunk.to_page();
                self.on_pages_received(vec![page], chunk.total_size, chunk.eof, chunk.sof)?
            }
        }
        Ok(true)
    }

    /// Inserts `pages` keyed by page number. The whole batch is rejected if
    /// any page's byte range would be out of order with, or overlap, the
    /// ranges of its neighbours.
    pub fn on_pages_received(
        &mut self,
        pages: Vec<Page>,
        total_size: u64,
        eof: bool,
        sof: bool,
    ) -> Result<(), ViewerError> {
        let state = self.state.as_mut().ok_or(ViewerError::NoOpenFile)?;

        // page number -> (offset, end)
        let mut ranges: BTreeMap<u64, (u64, u64)> = state
            .loaded_pages
            .iter()
            .map(|(number, page)| (*number, (page.offset, page.end())))
            .collect();
        for page in &pages {
            ranges.insert(page.page_number, (page.offset, page.end()));
            let before = ranges.range(..page.page_number).next_back();
            let after = ranges.range(page.page_number + 1..).next();
            let fits_after = before.is_none_or(|(_, &(offset, end))| {
                offset < page.offset && end <= page.offset
            });
            let fits_before = after.is_none_or(|(_, &(offset, _))| {
                offset > page.offset && page.end() <= offset
            });
            if !(fits_after && fits_before) {
                return Err(ViewerError::OutOfOrder {
                    page: page.page_number,
                    offset: page.offset,
                });
            }
        }

        for page in pages {
            state.loaded_pages.insert(page.page_number, page);
        }
        state.total_size = total_size;
        state.refresh_flags();

        if state.eof != eof || state.sof != sof {
            debug!(
                "reply flags eof={} sof={} differ from loaded coverage eof={} sof={}",
                eof, sof, state.eof, state.sof
            );
        }
        Ok(())
    }

    /// Loaded content in page order. Binary pages are joined with one
    /// space so hex pairs stay aligned across page boundaries.
    pub fn reassemble(&self) -> String {
        let Some(state) = &self.state else {
            return String::new();
        };
        let contents = state.loaded_pages.values().map(|p| p.content.as_str());
        match state.mode {
            ContentMode::Text => contents.collect(),
            ContentMode::Binary => contents
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Request for one page of the open file.
    pub fn chunk_request(&self, page_number: u64, byte_offset: u64) -> Option<ClientMessage> {
        let state = self.state.as_ref()?;
        Some(ClientMessage::FileSystem(FileSystemRequest::GetFileChunk {
            filepath: state.filename.clone(),
            mode: state.mode,
            pagesize: state.page_size,
            byteoffset: byte_offset,
            aspage: page_number,
        }))
    }

    /// Drops every page and asks for page 0 again.
    pub fn invalidate(&mut self) -> Option<ClientMessage> {
        let state = self.state.as_mut()?;
        state.loaded_pages.clear();
        state.eof = false;
        state.sof = false;
        debug!("invalidated {} at page size {}", state.filename, state.page_size);
        self.chunk_request(0, 0)
    }

    /// Applies a newly computed page size. Cached pages are only valid for
    /// the size they were read with, so any change invalidates.
    pub fn set_page_size(&mut self, page_size: u64) -> Option<ClientMessage> {
        let state = self.state.as_mut()?;
        if state.page_size == page_size {
            return None;
        }
        debug!("page size {} -> {}", state.page_size, page_size);
        state.page_size = page_size;
        self.invalidate()
    }

    /// Recomputes the page size for a resized content area.
    pub fn refit(&mut self, area: &ContentArea) -> Option<ClientMessage> {
        let mode = self.state.as_ref()?.mode;
        self.set_page_size(page_size_for_viewport(area, mode))
    }
}
