use crate::file_info::ContentMode;

/// Used whenever the content area cannot be measured.
pub const FALLBACK_PAGE_SIZE: u64 = 8192;
pub const MIN_PAGE_SIZE: u64 = 256;
/// Hex views lay out 16 bytes per line.
pub const BINARY_BYTES_PER_LINE: u64 = 16;

/// Measured size of the viewer's content area and of one monospace glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentArea {
    pub width: f64,
    pub height: f64,
    pub glyph_width: f64,
    pub glyph_height: f64,
}

/// Bytes that fill one screen of the content area.
pub fn page_size_for_viewport(area: &ContentArea, mode: ContentMode) -> u64 {
    let dims = [area.width, area.height, area.glyph_width, area.glyph_height];
    if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
        return FALLBACK_PAGE_SIZE;
    }

    let chars_per_line = (area.width / area.glyph_width).floor() as u64;
    let lines = (area.height / area.glyph_height).floor() as u64;

    let page_size = match mode {
        ContentMode::Text => chars_per_line * lines,
        ContentMode::Binary => BINARY_BYTES_PER_LINE * lines,
    };
    page_size.max(MIN_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(width: f64, height: f64) -> ContentArea {
        ContentArea {
            width,
            height,
            glyph_width: 7.0,
            glyph_height: 14.0,
        }
    }

    #[test]
    fn text_fills_the_grid() {
        // 100 columns x 50 lines
        assert_eq!(page_size_for_viewport(&area(700.0, 700.0), ContentMode::Text), 5000);
    }

    #[test]
    fn binary_uses_sixteen_bytes_per_line() {
        assert_eq!(page_size_for_viewport(&area(700.0, 700.0), ContentMode::Binary), 800);
    }

    #[test]
    fn small_areas_get_the_minimum() {
        assert_eq!(page_size_for_viewport(&area(70.0, 28.0), ContentMode::Text), MIN_PAGE_SIZE);
    }

    #[test]
    fn unmeasured_areas_fall_back() {
        assert_eq!(
            page_size_for_viewport(&area(0.0, 700.0), ContentMode::Text),
            FALLBACK_PAGE_SIZE
        );
    }
}
