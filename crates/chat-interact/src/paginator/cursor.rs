//! Page position bookkeeping.

/// Position within a sequence of pages whose length may not be known yet.
///
/// `index < known` holds at all times, and `known` never exceeds the real number of pages.
/// Once the total is known every page counts as known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    known: usize,
    total: Option<usize>,
}

impl Cursor {
    /// A cursor on the first page of a sequence with at least one page.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            index: 0,
            known: 1,
            total: None,
        }
    }

    /// Current page, zero-based.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Number of pages known to exist.
    #[must_use]
    pub const fn known(&self) -> usize {
        self.known
    }

    /// Total number of pages, once the end has been seen.
    #[must_use]
    pub const fn total(&self) -> Option<usize> {
        self.total
    }

    /// Whether there is exactly one page.
    #[must_use]
    pub const fn is_single(&self) -> bool {
        matches!(self.total, Some(1))
    }

    /// Page a forward move would try, or `None` when already on the final page.
    #[must_use]
    pub const fn next_candidate(&self) -> Option<usize> {
        match self.total {
            Some(total) if self.index + 1 >= total => None,
            _ => Some(self.index + 1),
        }
    }

    /// Record that page `index` exists.
    pub fn found(&mut self, index: usize) {
        self.known = self.known.max(index + 1);
    }

    /// Record that the sequence has `total` pages.
    pub fn end_at(&mut self, total: usize) {
        let total = total.max(1);
        self.total = Some(total);
        self.known = total;
        self.index = self.index.min(total - 1);
    }

    /// Move to `index` if it is known to exist. Returns whether the position changed.
    pub fn seek(&mut self, index: usize) -> bool {
        let index = index.min(self.known - 1);
        let moved = index != self.index;
        self.index = index;
        moved
    }

    /// Move to the first page.
    pub fn first(&mut self) -> bool {
        self.seek(0)
    }

    /// Move one page back, staying on the first page.
    pub fn previous(&mut self) -> bool {
        self.seek(self.index.saturating_sub(1))
    }

    /// Move to the last known page.
    pub fn last(&mut self) -> bool {
        self.seek(self.known - 1)
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_clamps_at_zero() {
        let mut cursor = Cursor::new();
        assert!(!cursor.previous());
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn seek_stays_within_known_pages() {
        let mut cursor = Cursor::new();
        cursor.found(3);
        assert!(cursor.seek(10));
        assert_eq!(cursor.index(), 3);
        assert!(cursor.first());
        assert!(cursor.last());
        assert_eq!(cursor.index(), 3);
    }

    #[test]
    fn end_stops_forward_moves() {
        let mut cursor = Cursor::new();
        cursor.found(1);
        cursor.seek(1);
        assert_eq!(cursor.next_candidate(), Some(2));
        cursor.end_at(2);
        assert_eq!(cursor.next_candidate(), None);
        assert_eq!(cursor.total(), Some(2));
        assert!(!cursor.is_single());
    }

    #[test]
    fn single_page() {
        let mut cursor = Cursor::new();
        cursor.end_at(1);
        assert!(cursor.is_single());
        assert_eq!(cursor.next_candidate(), None);
        assert!(!cursor.last());
    }
}
