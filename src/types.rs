use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel position in raster space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImgXY {
    pub x: usize,
    pub y: usize,
}

impl ImgXY {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for ImgXY {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Logical bit position: index into the column lines and the row lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitXY {
    pub col: usize,
    pub row: usize,
}

impl BitXY {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for BitXY {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.col, self.row)
    }
}

/// Grid axis. Column lines are vertical and indexed by x, row lines are
/// horizontal and indexed by y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Column,
    Row,
}

impl Axis {
    /// Pick the coordinate of `xy` that lies along this axis' line positions.
    #[inline]
    pub fn coord(self, xy: ImgXY) -> usize {
        match self {
            Axis::Column => xy.x,
            Axis::Row => xy.y,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Column => f.write_str("column"),
            Axis::Row => f.write_str("row"),
        }
    }
}
