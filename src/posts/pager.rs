use std::ops::Range;

/// Posts shown per page.
pub const DEFAULT_PAGE_SIZE: usize = 5;
/// Page-number buttons shown per group.
pub const DEFAULT_GROUP_SIZE: usize = 5;

/// Local pagination over an already aggregated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostPager {
    total_items: usize,
    page: usize,
    page_size: usize,
    group_size: usize,
}

impl PostPager {
    #[must_use]
    pub fn new(total_items: usize) -> Self {
        Self::with_sizes(total_items, DEFAULT_PAGE_SIZE, DEFAULT_GROUP_SIZE)
    }

    #[must_use]
    pub fn with_sizes(total_items: usize, page_size: usize, group_size: usize) -> Self {
        Self {
            total_items,
            page: 0,
            page_size: page_size.max(1),
            group_size: group_size.max(1),
        }
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    /// Jump to a page. Out-of-range requests are ignored.
    pub fn go_to(&mut self, page: usize) {
        if page < self.total_pages() {
            self.page = page;
        }
    }

    /// The slice of `items` on the current page.
    #[must_use]
    pub fn page_items<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page * self.page_size).min(items.len());
        let end = (start + self.page_size).min(items.len());
        &items[start..end]
    }

    /// First page index of the current group.
    #[must_use]
    pub fn group_start(&self) -> usize {
        (self.page / self.group_size) * self.group_size
    }

    /// Page indexes shown in the current group.
    #[must_use]
    pub fn group_pages(&self) -> Range<usize> {
        let start = self.group_start();
        start..(start + self.group_size).min(self.total_pages()).max(start)
    }

    #[must_use]
    pub fn has_prev_group(&self) -> bool {
        self.group_start() > 0
    }

    #[must_use]
    pub fn has_next_group(&self) -> bool {
        self.group_start() + self.group_size < self.total_pages()
    }

    pub fn prev_group(&mut self) {
        if self.has_prev_group() {
            self.page = self.group_start() - self.group_size;
        }
    }

    pub fn next_group(&mut self) {
        if self.has_next_group() {
            self.page = self.group_start() + self.group_size;
        }
    }

    /// One-based position of the `index`-th item on the current page.
    #[must_use]
    pub fn display_number(&self, index: usize) -> usize {
        index + 1 + self.page * self.page_size
    }
}
