//! Explicit pagination cursor for RPC enumerations.
//!
//! Callers drive the loop themselves: fetch a page at [Cursor::position], feed it to
//! [Cursor::advance], stop whenever they have what they need.

/// One page of a paginated RPC result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn last(data: Vec<T>) -> Self {
        Self {
            data,
            next_cursor: None,
            has_next_page: false,
        }
    }
}

/// Position within a paginated enumeration. In-memory only.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    next: Option<String>,
    exhausted: bool,
    pages_fetched: u32,
}

impl Cursor {
    /// Cursor at the first page.
    pub fn start() -> Self {
        Self::default()
    }

    /// Resume from an opaque cursor returned by a previous page.
    pub fn resume(cursor: impl Into<String>) -> Self {
        Self {
            next: Some(cursor.into()),
            ..Self::default()
        }
    }

    /// Cursor to pass to the next fetch (`None` = first page).
    pub fn position(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Record a fetched page. A page without a next cursor ends the enumeration
    /// even when `has_next_page` is set.
    pub fn advance<T>(&mut self, page: &Page<T>) {
        self.pages_fetched += 1;
        match (&page.next_cursor, page.has_next_page) {
            (Some(next), true) => self.next = Some(next.clone()),
            _ => {
                self.next = None;
                self.exhausted = true;
            }
        }
    }
}
