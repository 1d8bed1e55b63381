//! Client half of the file viewer: the page store and the scroll-driven
//! prefetcher that feeds it.

pub mod page_cache;
pub mod page_size;
pub mod prefetch;

pub use page_cache::{FileViewState, PageCache};
pub use page_size::{ContentArea, page_size_for_viewport};
pub use prefetch::{ScrollPrefetcher, Viewport};
