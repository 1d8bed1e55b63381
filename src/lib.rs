//! Browser-facing remote shell with a paged side-channel file viewer.
//!
//! One WebSocket per session carries raw terminal bytes and structured
//! control messages side by side. The server half pages file content out on
//! demand; the [`viewer`] half keeps those pages in order on the client.

pub mod args;
pub mod channel;
pub mod error;
pub mod file_info;
pub mod files;
pub mod protocol;
pub mod pty;
pub mod server;
pub mod system_info;
pub mod terminal_session;
pub mod viewer;
