//! Skip/limit page planning for large result sets.

/// Hard upper bound on rows per data request, enforced server-side.
pub const MAX_PAGE_ROWS: u64 = 150_000;

/// Page stride used when a plan would exceed [`MAX_PAGE_ROWS`].
///
/// A prime just above 100k keeps page boundaries from lining up with the
/// server's internal batch sizes.
pub const RESTRIDE_ROWS: u64 = 102_161;

/// A contiguous row range of a stream, expressed as skip/limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRange {
    /// Rows to skip before this page.
    pub skip: u64,
    /// Number of rows in this page.
    pub rows: u64,
}

impl PageRange {
    /// Creates a page range.
    #[must_use]
    pub const fn new(skip: u64, rows: u64) -> Self {
        Self { skip, rows }
    }

    /// The first row index past this page.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.skip + self.rows
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.skip, self.end())
    }
}

/// Splits `total` rows into at most `max_batches` pages.
///
/// The plan divides the row count evenly and appends a tail page for the
/// remainder. If even division would produce pages at or above the server's
/// [`MAX_PAGE_ROWS`] limit, the plan falls back to fixed
/// [`RESTRIDE_ROWS`]-row pages instead.
///
/// The returned ranges cover exactly `[0, total)` with no overlap; an empty
/// plan is returned only for `total == 0`.
#[must_use]
pub fn plan_pages(total: u64, max_batches: usize) -> Vec<PageRange> {
    if total == 0 {
        return Vec::new();
    }

    let batches = max_batches.max(1) as u64;
    let rows_per_page = total / batches;

    // Fewer rows than batches: one page is enough.
    if rows_per_page == 0 {
        return vec![PageRange::new(0, total)];
    }

    if rows_per_page >= MAX_PAGE_ROWS {
        return stride_pages(total, RESTRIDE_ROWS);
    }

    let mut pages: Vec<PageRange> = (0..batches)
        .map(|i| PageRange::new(i * rows_per_page, rows_per_page))
        .collect();

    let covered = rows_per_page * batches;
    if covered < total {
        pages.push(PageRange::new(covered, total - covered));
    }

    pages
}

/// Splits `total` rows into fixed-size pages of `stride` rows each.
#[must_use]
pub fn stride_pages(total: u64, stride: u64) -> Vec<PageRange> {
    if total == 0 || stride == 0 {
        return Vec::new();
    }

    let mut pages = Vec::with_capacity(total.div_ceil(stride) as usize);
    let mut skip = 0;
    while skip < total {
        let rows = stride.min(total - skip);
        pages.push(PageRange::new(skip, rows));
        skip += rows;
    }
    pages
}
