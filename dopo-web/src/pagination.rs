//! Pagination utilities for list endpoints
//!
//! Lists are offset-based. The CMS reports no totals on these reads, so
//! `hasMore` is inferred from whether a full page came back.

/// Page size when the request does not name one
pub const DEFAULT_LIMIT: i64 = 20;

/// Sanitized page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Rows requested from the CMS, within `1..=max_page_size`
    pub limit: u32,
    /// Rows skipped
    pub offset: u32,
}

impl PageWindow {
    /// Clamp a requested window to valid bounds
    ///
    /// # Examples
    /// ```
    /// use dopo_web::pagination::PageWindow;
    ///
    /// let w = PageWindow::clamped(500, -3, 100);
    /// assert_eq!(w.limit, 100);
    /// assert_eq!(w.offset, 0);
    ///
    /// let w = PageWindow::clamped(0, 40, 100);
    /// assert_eq!(w.limit, 1);
    /// assert_eq!(w.offset, 40);
    /// ```
    pub fn clamped(limit: i64, offset: i64, max_page_size: u32) -> Self {
        let max = i64::from(max_page_size.max(1));
        Self {
            limit: limit.clamp(1, max) as u32,
            offset: offset.clamp(0, i64::from(u32::MAX)) as u32,
        }
    }

    /// More rows may follow when the page came back full
    pub fn has_more(&self, returned: usize) -> bool {
        returned == self.limit as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_within_bounds_is_unchanged() {
        let w = PageWindow::clamped(20, 40, 100);
        assert_eq!(w, PageWindow { limit: 20, offset: 40 });
    }

    #[test]
    fn test_has_more_full_page() {
        let w = PageWindow::clamped(2, 0, 100);
        assert!(w.has_more(2));
        assert!(!w.has_more(1));
        assert!(!w.has_more(0));
    }

    #[test]
    fn test_has_more_uses_effective_limit() {
        let w = PageWindow::clamped(1000, 0, 100);
        assert!(w.has_more(100));
    }
}
