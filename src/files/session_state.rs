use std::path::PathBuf;

/// Per-connection browser state. Never shared between sessions.
#[derive(Debug)]
pub struct SessionState {
    /// Directory cursor. Always an existing directory as of its last
    /// successful resolution.
    pub current_dir: PathBuf,
    pub max_page_size: u64,
}
