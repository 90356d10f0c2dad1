//! Sequential cursor over a fixed-length lesson series

use super::{ContentError, ContentResult};

/// Position in a cyclic series, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesCursor {
    day_index: usize,
    series_length: usize,
}

impl SeriesCursor {
    /// Create a cursor starting at `start_day`
    ///
    /// Out-of-range start days wrap into `1..=series_length`.
    pub fn new(series_length: usize, start_day: usize) -> ContentResult<Self> {
        if series_length == 0 {
            return Err(ContentError::EmptyCatalog("series".to_string()));
        }
        let day_index = (start_day.max(1) - 1) % series_length + 1;
        Ok(Self {
            day_index,
            series_length,
        })
    }

    /// Return the current entry and advance, wrapping after the last day
    pub fn next<'a, T>(&mut self, series: &'a [T]) -> ContentResult<&'a T> {
        if series.is_empty() {
            return Err(ContentError::EmptyCatalog("series".to_string()));
        }
        let item = &series[(self.day_index - 1) % series.len()];
        self.day_index = self.day_index % self.series_length + 1;
        Ok(item)
    }

    /// The day that the next call to [`next`](Self::next) will return
    pub fn day_index(&self) -> usize {
        self.day_index
    }

    pub fn series_length(&self) -> usize {
        self.series_length
    }
}
