//! Dense bit matrix, one entry per grid intersection.
//!
//! Entries are stored column by column (`index = col * rows + row`), the same
//! order [`GridLines::iter_bits`](crate::grid::GridLines::iter_bits) walks and
//! grid documents persist.
use crate::error::{Error, Result};
use crate::types::BitXY;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitMatrix {
    cols: usize,
    rows: usize,
    data: Vec<bool>,
}

impl BitMatrix {
    /// All-zero matrix of `cols × rows`.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            data: vec![false; cols * rows],
        }
    }

    /// Adopt a flattened bit sequence; its length must equal `cols * rows`.
    pub fn from_bits(cols: usize, rows: usize, data: Vec<bool>) -> Result<Self> {
        if data.len() != cols * rows {
            return Err(Error::DataShapeMismatch {
                expected: cols * rows,
                found: data.len(),
            });
        }
        Ok(Self { cols, rows, data })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    pub fn count_ones(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }

    fn index(&self, bit: BitXY) -> Result<usize> {
        if bit.col >= self.cols || bit.row >= self.rows {
            return Err(Error::OutOfRange {
                col: bit.col,
                row: bit.row,
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok(bit.col * self.rows + bit.row)
    }

    pub fn get(&self, bit: BitXY) -> Result<bool> {
        Ok(self.data[self.index(bit)?])
    }

    pub fn set(&mut self, bit: BitXY, value: bool) -> Result<()> {
        let i = self.index(bit)?;
        self.data[i] = value;
        Ok(())
    }

    /// Flip one bit and return its new value.
    pub fn toggle(&mut self, bit: BitXY) -> Result<bool> {
        let i = self.index(bit)?;
        self.data[i] = !self.data[i];
        Ok(self.data[i])
    }

    /// Insert an all-zero column before `col` (`col == cols` appends).
    pub fn insert_column(&mut self, col: usize) -> Result<()> {
        if col > self.cols {
            return Err(self.axis_error(col, 0));
        }
        let at = col * self.rows;
        self.data
            .splice(at..at, std::iter::repeat(false).take(self.rows));
        self.cols += 1;
        Ok(())
    }

    pub fn remove_column(&mut self, col: usize) -> Result<()> {
        if col >= self.cols {
            return Err(self.axis_error(col, 0));
        }
        let at = col * self.rows;
        self.data.drain(at..at + self.rows);
        self.cols -= 1;
        Ok(())
    }

    /// Insert an all-zero row before `row` (`row == rows` appends).
    pub fn insert_row(&mut self, row: usize) -> Result<()> {
        if row > self.rows {
            return Err(self.axis_error(0, row));
        }
        let rows = self.rows;
        let mut data = Vec::with_capacity(self.cols * (rows + 1));
        for column in self.data.chunks(rows.max(1)).take(self.cols) {
            data.extend_from_slice(&column[..row]);
            data.push(false);
            data.extend_from_slice(&column[row..]);
        }
        if rows == 0 {
            data = vec![false; self.cols];
        }
        self.data = data;
        self.rows += 1;
        Ok(())
    }

    pub fn remove_row(&mut self, row: usize) -> Result<()> {
        if row >= self.rows {
            return Err(self.axis_error(0, row));
        }
        let rows = self.rows;
        let mut i = 0;
        self.data.retain(|_| {
            let keep = i % rows != row;
            i += 1;
            keep
        });
        self.rows -= 1;
        Ok(())
    }

    fn axis_error(&self, col: usize, row: usize) -> Error {
        Error::OutOfRange {
            col,
            row,
            cols: self.cols,
            rows: self.rows,
        }
    }

    /// `'0'`/`'1'` characters in storage order.
    pub fn to_bit_string(&self) -> String {
        self.data.iter().map(|&b| if b { '1' } else { '0' }).collect()
    }

    /// Parse a `'0'`/`'1'` string in storage order.
    pub fn parse_bit_string(cols: usize, rows: usize, text: &str) -> Result<Self> {
        let data = text
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(Error::InvalidDocument(format!(
                    "unexpected bit character {other:?}"
                ))),
            })
            .collect::<Result<Vec<bool>>>()?;
        Self::from_bits(cols, rows, data)
    }
}
