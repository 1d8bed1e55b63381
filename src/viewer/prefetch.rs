use log::debug;

use crate::protocol::ClientMessage;

use super::page_cache::PageCache;

/// Scroll geometry of the content element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl Viewport {
    fn near_bottom(&self, margin: f64) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - margin
    }

    fn near_top(&self, margin: f64) -> bool {
        self.scroll_top <= margin
    }
}

/// Turns scroll positions into requests for the page adjacent to the
/// loaded range. Requests are not de-duplicated; a repeat for a page still
/// in flight is harmless because the cache insert is idempotent.
#[derive(Debug, Clone, Copy)]
pub struct ScrollPrefetcher {
    margin: f64,
}

impl Default for ScrollPrefetcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARGIN)
    }
}

impl ScrollPrefetcher {
    pub const DEFAULT_MARGIN: f64 = 100.0;

    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    pub fn on_scroll(&self, viewport: &Viewport, cache: &PageCache) -> Option<ClientMessage> {
        let state = cache.state()?;
        let (first, last) = (state.first_page()?, state.last_page()?);

        if viewport.near_bottom(self.margin) && !state.eof {
            let next = last + 1;
            debug!("prefetch forward: page {}", next);
            return cache.chunk_request(next, next * state.page_size);
        }

        if viewport.near_top(self.margin) && !state.sof {
            let prev = first.checked_sub(1)?;
            debug!("prefetch backward: page {}", prev);
            return cache.chunk_request(prev, prev * state.page_size);
        }

        None
    }
}
