use std::ops::Range;

/// Contiguous window of materialized rows, `first_row..first_row + rows.len()`
#[derive(Debug)]
pub(crate) struct RowCache<T> {
    first_row: usize,
    rows: Vec<T>,
}

impl<T> RowCache<T> {
    pub fn new() -> Self {
        Self {
            first_row: 0,
            rows: Vec::new(),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.first_row..self.first_row + self.rows.len()
    }

    pub fn first_row(&self) -> usize {
        self.first_row
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.range().contains(&row)
    }

    pub fn get(&self, row: usize) -> Option<&T> {
        row.checked_sub(self.first_row)
            .and_then(|idx| self.rows.get(idx))
    }

    pub fn get_mut(&mut self, row: usize) -> Option<&mut T> {
        row.checked_sub(self.first_row)
            .and_then(|idx| self.rows.get_mut(idx))
    }

    pub fn position(&self, pred: impl Fn(&T) -> bool) -> Option<usize> {
        self.rows
            .iter()
            .position(pred)
            .map(|idx| self.first_row + idx)
    }

    /// Replace the whole window; never merges with the previous one
    pub fn replace(&mut self, first_row: usize, rows: Vec<T>) {
        self.first_row = first_row;
        self.rows = rows;
    }

    pub fn clear(&mut self) {
        self.rows = Vec::new();
        self.first_row = 0;
    }

    /// Drop every row at index `row` or later
    pub fn truncate_from(&mut self, row: usize) {
        if row <= self.first_row {
            self.clear();
        } else {
            self.rows.truncate(row - self.first_row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_relative_to_first_row() {
        let mut cache = RowCache::new();
        cache.replace(10, vec!['a', 'b', 'c']);
        assert_eq!(cache.range(), 10..13);
        assert_eq!(cache.get(11), Some(&'b'));
        assert_eq!(cache.get(9), None);
        assert_eq!(cache.get(13), None);
        assert_eq!(cache.position(|c| *c == 'c'), Some(12));
    }

    #[test]
    fn truncate_before_window_clears() {
        let mut cache = RowCache::new();
        cache.replace(10, vec![1, 2, 3]);
        cache.truncate_from(12);
        assert_eq!(cache.range(), 10..12);
        cache.truncate_from(4);
        assert!(cache.is_empty());
        assert_eq!(cache.first_row(), 0);
    }
}
