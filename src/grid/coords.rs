//! Bit ↔ image coordinate mapping over the current [`GridLines`].
//!
//! Near-click lookups use a first-match rule: the lowest-index line within
//! `radius / 2` pixels wins on each axis, even if a later line is closer.
//! Toggle and selection clicks share this rule.
use super::lines::GridLines;
use crate::error::{Error, Result};
use crate::types::{BitXY, ImgXY};

/// How `image_to_bit` matches a pixel against the line positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lookup {
    /// The pixel must sit exactly on a column and a row line.
    Exact,
    /// Accept lines within `radius / 2` pixels of the pixel.
    Nearby { radius: u32 },
}

impl GridLines {
    /// Image position of the intersection `bit`.
    pub fn bit_to_image(&self, bit: BitXY) -> Result<ImgXY> {
        match (self.columns().get(bit.col), self.rows().get(bit.row)) {
            (Some(&x), Some(&y)) => Ok(ImgXY::new(x, y)),
            _ => Err(self.out_of_range(bit)),
        }
    }

    /// Intersection matching the pixel `img`.
    pub fn image_to_bit(&self, img: ImgXY, lookup: Lookup) -> Result<BitXY> {
        let found = match lookup {
            Lookup::Exact => self
                .columns()
                .binary_search(&img.x)
                .ok()
                .zip(self.rows().binary_search(&img.y).ok()),
            Lookup::Nearby { radius } => {
                let tol = radius as f64 / 2.0;
                first_within(self.columns(), img.x, tol)
                    .zip(first_within(self.rows(), img.y, tol))
            }
        };
        found
            .map(|(col, row)| BitXY::new(col, row))
            .ok_or(Error::NotFound { x: img.x, y: img.y })
    }

    /// Fail with `OutOfRange` unless `bit` addresses a current intersection.
    pub fn check_bit(&self, bit: BitXY) -> Result<()> {
        if bit.col < self.columns().len() && bit.row < self.rows().len() {
            Ok(())
        } else {
            Err(self.out_of_range(bit))
        }
    }

    fn out_of_range(&self, bit: BitXY) -> Error {
        let (cols, rows) = self.shape();
        Error::OutOfRange {
            col: bit.col,
            row: bit.row,
            cols,
            rows,
        }
    }

    /// Every bit coordinate, column index outer and row index inner.
    pub fn iter_bits(&self) -> impl Iterator<Item = BitXY> + '_ {
        let rows = self.rows().len();
        (0..self.columns().len()).flat_map(move |col| (0..rows).map(move |row| BitXY::new(col, row)))
    }
}

fn first_within(lines: &[usize], coord: usize, tol: f64) -> Option<usize> {
    lines
        .iter()
        .position(|&line| (line as f64 - coord as f64).abs() <= tol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridLines {
        GridLines::from_points(vec![10, 20, 30], vec![5, 15])
    }

    #[test]
    fn exact_lookup_inverts_bit_to_image() {
        let g = grid();
        for bit in g.iter_bits() {
            let img = g.bit_to_image(bit).expect("in range");
            assert_eq!(g.image_to_bit(img, Lookup::Exact).expect("exact"), bit);
        }
    }

    #[test]
    fn stale_indices_are_out_of_range() {
        let g = grid();
        assert!(matches!(
            g.bit_to_image(BitXY::new(3, 0)),
            Err(Error::OutOfRange { cols: 3, rows: 2, .. })
        ));
        assert!(g.bit_to_image(BitXY::new(0, 2)).is_err());
        assert!(g.check_bit(BitXY::new(2, 1)).is_ok());
    }

    #[test]
    fn exact_lookup_misses_off_line_pixels() {
        assert!(matches!(
            grid().image_to_bit(ImgXY::new(11, 5), Lookup::Exact),
            Err(Error::NotFound { x: 11, y: 5 })
        ));
    }

    #[test]
    fn nearby_lookup_uses_half_radius_tolerance() {
        let g = grid();
        let near = Lookup::Nearby { radius: 6 };
        assert_eq!(
            g.image_to_bit(ImgXY::new(23, 12), near).expect("hit"),
            BitXY::new(1, 1)
        );
        assert!(g.image_to_bit(ImgXY::new(24, 12), near).is_err());
    }

    #[test]
    fn nearby_lookup_prefers_lowest_index() {
        let g = GridLines::from_points(vec![10, 14], vec![0]);
        // 13 is closer to 14, but 10 is the first line within tolerance.
        let hit = g
            .image_to_bit(ImgXY::new(13, 0), Lookup::Nearby { radius: 8 })
            .expect("hit");
        assert_eq!(hit, BitXY::new(0, 0));
    }

    #[test]
    fn iteration_is_column_major() {
        let order: Vec<BitXY> = grid().iter_bits().take(3).collect();
        assert_eq!(
            order,
            vec![BitXY::new(0, 0), BitXY::new(0, 1), BitXY::new(1, 0)]
        );
    }
}
