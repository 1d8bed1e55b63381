pub mod browser;
pub mod handlers;
pub mod session_state;
pub mod utils;

pub use browser::FileBrowser;
pub use session_state::*;
