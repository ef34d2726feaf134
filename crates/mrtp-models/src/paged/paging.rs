//! Page arithmetic

/// Row count and page position of a model.
///
/// Invariants: `cur_page < page_count` when `page_count > 0`, otherwise
/// `cur_page == 0`; `cur_item_count` is the number of rows on `cur_page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PagingState {
    total: u64,
    items_per_page: usize,
    page_count: usize,
    cur_page: usize,
    cur_item_count: usize,
}

impl PagingState {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            total: 0,
            items_per_page: items_per_page.max(1),
            page_count: 0,
            cur_page: 0,
            cur_item_count: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn cur_page(&self) -> usize {
        self.cur_page
    }

    pub fn cur_item_count(&self) -> usize {
        self.cur_item_count
    }

    /// Absolute offset of the first row of the current page
    pub fn page_offset(&self) -> u64 {
        self.cur_page as u64 * self.items_per_page as u64
    }

    /// Apply a new total row count, clamping the current page into range
    pub fn set_total(&mut self, total: u64) {
        let per_page = self.items_per_page as u64;
        self.total = total;
        self.page_count = total.div_ceil(per_page) as usize;
        if self.cur_page >= self.page_count {
            self.cur_page = self.page_count.saturating_sub(1);
        }
        self.cur_item_count = self.items_on_page(self.cur_page);
    }

    /// Move to `page`. Returns `false` if it is current or out of range.
    pub fn set_page(&mut self, page: usize) -> bool {
        if page == self.cur_page || page >= self.page_count {
            return false;
        }
        self.cur_page = page;
        self.cur_item_count = self.items_on_page(page);
        true
    }

    fn items_on_page(&self, page: usize) -> usize {
        if self.page_count == 0 {
            return 0;
        }
        let rem = (self.total % self.items_per_page as u64) as usize;
        if page == self.page_count - 1 && rem != 0 {
            rem
        } else {
            self.items_per_page
        }
    }
}
