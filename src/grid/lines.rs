use crate::error::{Error, Result};
use crate::types::Axis;
use serde::{Deserialize, Serialize};

/// Column and row line positions in pixels.
///
/// Both sequences are strictly increasing. Every mutation goes through this
/// type so the ordering cannot be broken from outside.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLines {
    columns: Vec<usize>,
    rows: Vec<usize>,
}

impl GridLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary point lists; sorts and drops duplicates.
    pub fn from_points(mut columns: Vec<usize>, mut rows: Vec<usize>) -> Self {
        columns.sort_unstable();
        columns.dedup();
        rows.sort_unstable();
        rows.dedup();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn axis(&self, axis: Axis) -> &[usize] {
        match axis {
            Axis::Column => &self.columns,
            Axis::Row => &self.rows,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut Vec<usize> {
        match axis {
            Axis::Column => &mut self.columns,
            Axis::Row => &mut self.rows,
        }
    }

    /// `(columns, rows)` line counts.
    pub fn shape(&self) -> (usize, usize) {
        (self.columns.len(), self.rows.len())
    }

    /// Number of intersections.
    pub fn intersections(&self) -> usize {
        self.columns.len() * self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    pub fn contains(&self, axis: Axis, pos: usize) -> bool {
        self.axis(axis).binary_search(&pos).is_ok()
    }

    /// Insert a line keeping the order. Returns the new index, or `None` if a
    /// line already sits at `pos`.
    pub fn insert(&mut self, axis: Axis, pos: usize) -> Option<usize> {
        let lines = self.axis_mut(axis);
        match lines.binary_search(&pos) {
            Ok(_) => None,
            Err(idx) => {
                lines.insert(idx, pos);
                Some(idx)
            }
        }
    }

    /// Remove the line at `index`, returning its position.
    pub fn remove(&mut self, axis: Axis, index: usize) -> Option<usize> {
        let lines = self.axis_mut(axis);
        (index < lines.len()).then(|| lines.remove(index))
    }

    /// Move one line by `delta` pixels. The line must stay strictly between
    /// its neighbours and inside `[0, extent)`; otherwise nothing changes and
    /// `false` is returned.
    pub fn shift(&mut self, axis: Axis, index: usize, delta: i64, extent: usize) -> bool {
        let lines = self.axis_mut(axis);
        let Some(&cur) = lines.get(index) else {
            return false;
        };
        let target = cur as i64 + delta;
        let lower = if index == 0 {
            -1
        } else {
            lines[index - 1] as i64
        };
        let upper = lines
            .get(index + 1)
            .map(|&v| v as i64)
            .unwrap_or(extent as i64);
        if target <= lower || target >= upper || target >= extent as i64 {
            return false;
        }
        lines[index] = target as usize;
        true
    }

    /// Move a contiguous run of lines together. Either every line moves or
    /// none does.
    pub fn shift_range(
        &mut self,
        axis: Axis,
        range: std::ops::Range<usize>,
        delta: i64,
        extent: usize,
    ) -> bool {
        let lines = self.axis_mut(axis);
        if range.is_empty() || range.end > lines.len() {
            return false;
        }
        let first = lines[range.start] as i64 + delta;
        let last = lines[range.end - 1] as i64 + delta;
        let lower = if range.start == 0 {
            -1
        } else {
            lines[range.start - 1] as i64
        };
        let upper = lines
            .get(range.end)
            .map(|&v| v as i64)
            .unwrap_or(extent as i64);
        if first <= lower || last >= upper || last >= extent as i64 {
            return false;
        }
        for v in &mut lines[range] {
            *v = (*v as i64 + delta) as usize;
        }
        true
    }

    pub fn clear_axis(&mut self, axis: Axis) {
        self.axis_mut(axis).clear();
    }

    /// Fail if any line lies outside a `width × height` raster.
    pub fn check_extent(&self, width: usize, height: usize) -> Result<()> {
        if let Some(&x) = self.columns.iter().find(|&&x| x >= width) {
            return Err(Error::InvalidDocument(format!(
                "column line at x={x} outside image width {width}"
            )));
        }
        if let Some(&y) = self.rows.iter().find(|&&y| y >= height) {
            return Err(Error::InvalidDocument(format!(
                "row line at y={y} outside image height {height}"
            )));
        }
        Ok(())
    }

    /// Spacing between the first two lines of an axis, if there are two.
    pub fn first_spacing(&self, axis: Axis) -> Option<f64> {
        let lines = self.axis(axis);
        (lines.len() > 1).then(|| lines[1] as f64 - lines[0] as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_sorts_and_dedups() {
        let g = GridLines::from_points(vec![30, 10, 20, 10], vec![5, 5]);
        assert_eq!(g.columns(), &[10, 20, 30]);
        assert_eq!(g.rows(), &[5]);
        assert_eq!(g.intersections(), 3);
    }

    #[test]
    fn insert_keeps_order_and_rejects_duplicates() {
        let mut g = GridLines::from_points(vec![10, 30], vec![]);
        assert_eq!(g.insert(Axis::Column, 20), Some(1));
        assert_eq!(g.insert(Axis::Column, 20), None);
        assert_eq!(g.columns(), &[10, 20, 30]);
    }

    #[test]
    fn shift_respects_neighbours_and_extent() {
        let mut g = GridLines::from_points(vec![10, 11, 20], vec![0]);
        assert!(!g.shift(Axis::Column, 1, -1, 100), "would collide with 10");
        assert!(g.shift(Axis::Column, 1, 1, 100));
        assert_eq!(g.columns(), &[10, 12, 20]);
        assert!(!g.shift(Axis::Row, 0, -1, 100), "would leave the image");
        assert!(!g.shift(Axis::Column, 2, 80, 100));
        assert!(!g.shift(Axis::Column, 7, 1, 100));
    }

    #[test]
    fn shift_range_moves_all_or_nothing() {
        let mut g = GridLines::from_points(vec![10, 20, 30, 40], vec![]);
        assert!(g.shift_range(Axis::Column, 0..2, -3, 50));
        assert_eq!(g.columns(), &[7, 17, 30, 40]);
        assert!(!g.shift_range(Axis::Column, 2..4, 10, 50));
        assert_eq!(g.columns(), &[7, 17, 30, 40]);
    }

    #[test]
    fn check_extent_flags_out_of_bounds_lines() {
        let g = GridLines::from_points(vec![0, 99], vec![49]);
        assert!(g.check_extent(100, 50).is_ok());
        assert!(g.check_extent(99, 50).is_err());
        assert!(g.check_extent(100, 49).is_err());
    }
}
