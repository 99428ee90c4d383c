use crate::{QueryError, QueryResult};
use std::ops::Range;

/// A validated pagination window. Both number and size are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    number: usize,
    size: usize,
}

impl Page {
    pub fn new(number: i64, size: i64) -> QueryResult<Self> {
        let invalid = || QueryError::InvalidPage { number, size };
        if number < 1 || size < 1 {
            return Err(invalid());
        }
        Ok(Self {
            number: usize::try_from(number).map_err(|_| invalid())?,
            size: usize::try_from(size).map_err(|_| invalid())?,
        })
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Elements to skip: `(number - 1) * size`, saturating.
    pub fn skip(&self) -> usize {
        (self.number - 1).saturating_mul(self.size)
    }

    /// Index range selected from a sequence of `len` items. Empty past the end.
    pub fn window(&self, len: usize) -> Range<usize> {
        let start = self.skip().min(len);
        let end = start.saturating_add(self.size).min(len);
        start..end
    }
}

/// Returns the page's slice of an already filtered and ordered sequence.
pub fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.skip())
        .take(page.size())
        .collect()
}
