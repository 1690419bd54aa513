//! Bit matrix ↔ byte stream conversion.
//!
//! Packing order: column groups left to right; inside a group every row top
//! to bottom; inside a row the group's `group_cols` bits left to right, cut
//! into bytes of 8. Inversion is applied to the bits first, then each byte is
//! assembled MSB-first (or LSB-first when `lsb_first` is set).
//!
//! Columns past the last complete group are not packed.
use crate::bits::BitMatrix;
use crate::config::{DecodeConfig, GroupLayout};
use crate::error::{Error, Result};
use crate::types::BitXY;
use log::warn;
use std::fmt::Write;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackOptions {
    pub inverted: bool,
    pub lsb_first: bool,
}

impl From<&DecodeConfig> for PackOptions {
    fn from(cfg: &DecodeConfig) -> Self {
        Self {
            inverted: cfg.inverted,
            lsb_first: cfg.lsb_mode,
        }
    }
}

/// Number of complete column groups.
pub fn column_groups(cols: usize, layout: GroupLayout) -> usize {
    cols / layout.cols
}

fn byte_from_bits(bits: &[bool], lsb_first: bool) -> u8 {
    bits.iter().enumerate().fold(0u8, |acc, (i, &b)| {
        if !b {
            return acc;
        }
        let shift = if lsb_first { i } else { 7 - i };
        acc | (1 << shift)
    })
}

fn bits_from_byte(byte: u8, lsb_first: bool) -> [bool; 8] {
    let mut out = [false; 8];
    for (i, slot) in out.iter_mut().enumerate() {
        let shift = if lsb_first { i } else { 7 - i };
        *slot = byte & (1 << shift) != 0;
    }
    out
}

/// Pack the matrix into bytes.
pub fn pack(bits: &BitMatrix, layout: GroupLayout, opts: PackOptions) -> Result<Vec<u8>> {
    let bytes_per_chunk = layout.bytes_per_chunk()?;
    let (cols, rows) = bits.shape();
    let groups = column_groups(cols, layout);
    if groups * layout.cols != cols {
        warn!(
            "{} trailing column(s) do not fill a group of {} and are not packed",
            cols - groups * layout.cols,
            layout.cols
        );
    }

    let mut out = Vec::with_capacity(groups * rows * bytes_per_chunk);
    let mut chunk = vec![false; layout.cols];
    for group in 0..groups {
        for row in 0..rows {
            for (x, slot) in chunk.iter_mut().enumerate() {
                *slot = bits.get(BitXY::new(group * layout.cols + x, row))? ^ opts.inverted;
            }
            out.extend(chunk.chunks_exact(8).map(|b| byte_from_bits(b, opts.lsb_first)));
        }
    }
    Ok(out)
}

/// Inverse of [`pack`] for a `cols × rows` grid. Columns past the last
/// complete group come back as zeros.
pub fn unpack(
    bytes: &[u8],
    cols: usize,
    rows: usize,
    layout: GroupLayout,
    opts: PackOptions,
) -> Result<BitMatrix> {
    let bytes_per_chunk = layout.bytes_per_chunk()?;
    let groups = column_groups(cols, layout);
    let expected = groups * rows * bytes_per_chunk;
    if bytes.len() != expected {
        return Err(Error::DataShapeMismatch {
            expected,
            found: bytes.len(),
        });
    }

    let mut bits = BitMatrix::new(cols, rows);
    let mut chunks = bytes.chunks_exact(bytes_per_chunk);
    for group in 0..groups {
        for row in 0..rows {
            let Some(chunk) = chunks.next() else {
                break;
            };
            for (b, &byte) in chunk.iter().enumerate() {
                for (i, bit) in bits_from_byte(byte, opts.lsb_first).into_iter().enumerate() {
                    let col = group * layout.cols + b * 8 + i;
                    bits.set(BitXY::new(col, row), bit ^ opts.inverted)?;
                }
            }
        }
    }
    Ok(bits)
}

/// Split a packed stream into one slice per column group.
pub fn split_groups(bytes: &[u8], groups: usize) -> Vec<&[u8]> {
    if groups == 0 || bytes.is_empty() {
        return Vec::new();
    }
    bytes.chunks(bytes.len() / groups).collect()
}

/// Packed bytes rearranged per grid row: row `r` holds the bytes of every
/// column group for that row, left to right.
pub fn byte_rows(bits: &BitMatrix, layout: GroupLayout, opts: PackOptions) -> Result<Vec<Vec<u8>>> {
    let packed = pack(bits, layout, opts)?;
    let bytes_per_chunk = layout.bytes_per_chunk()?;
    let rows = bits.rows();
    let groups = column_groups(bits.cols(), layout);
    let mut out = vec![Vec::with_capacity(groups * bytes_per_chunk); rows];
    for (i, chunk) in packed.chunks_exact(bytes_per_chunk.max(1)).enumerate() {
        out[i % rows.max(1)].extend_from_slice(chunk);
    }
    Ok(out)
}

/// Render one row of bytes as `"A1 FF "` hex or as space-separated bit strings.
pub fn format_byte_row(row: &[u8], binary: bool) -> String {
    let mut s = String::with_capacity(row.len() * if binary { 9 } else { 3 });
    for &b in row {
        if binary {
            let _ = write!(s, "{b:08b} ");
        } else {
            let _ = write!(s, "{b:02X} ");
        }
    }
    s
}

/// Human-readable bit dump: one line per grid row, a space every
/// `layout.cols` columns and a blank line every `layout.rows` rows.
pub fn render_text(bits: &BitMatrix, layout: GroupLayout) -> String {
    let (cols, rows) = bits.shape();
    let mut s = String::with_capacity((cols + cols / layout.cols + 1) * rows + rows / layout.rows);
    for row in 0..rows {
        if row != 0 && row % layout.rows == 0 {
            s.push('\n');
        }
        for col in 0..cols {
            if col != 0 && col % layout.cols == 0 {
                s.push(' ');
            }
            let set = bits.get(BitXY::new(col, row)).unwrap_or(false);
            s.push(if set { '1' } else { '0' });
        }
        s.push('\n');
    }
    s
}

/// Parse the output of [`render_text`]. Separator spaces and blank lines
/// are ignored; every remaining line must have the same width.
pub fn parse_text(text: &str) -> Result<BitMatrix> {
    let lines: Vec<Vec<bool>> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            l.chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| match c {
                    '0' => Ok(false),
                    '1' => Ok(true),
                    other => Err(Error::InvalidDocument(format!(
                        "unexpected character {other:?} in bit text"
                    ))),
                })
                .collect()
        })
        .collect::<Result<_>>()?;

    let rows = lines.len();
    let cols = lines.first().map_or(0, Vec::len);
    if let Some(bad) = lines.iter().find(|l| l.len() != cols) {
        return Err(Error::DataShapeMismatch {
            expected: cols,
            found: bad.len(),
        });
    }
    let mut bits = BitMatrix::new(cols, rows);
    for (row, line) in lines.iter().enumerate() {
        for (col, &b) in line.iter().enumerate() {
            bits.set(BitXY::new(col, row), b)?;
        }
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(cols: usize, rows: usize) -> GroupLayout {
        GroupLayout::new(cols, rows).expect("layout")
    }

    fn row_pattern(cols: usize, rows: usize, f: impl Fn(usize, usize) -> bool) -> BitMatrix {
        let data = (0..cols)
            .flat_map(|c| (0..rows).map(move |r| (c, r)))
            .map(|(c, r)| f(c, r))
            .collect();
        BitMatrix::from_bits(cols, rows, data).expect("shape")
    }

    #[test]
    fn msb_and_lsb_byte_assembly() {
        // Row 0: 1000_0011, row 1: all zeros.
        let bits = row_pattern(8, 2, |c, r| r == 0 && (c == 0 || c >= 6));
        let msb = pack(&bits, layout(8, 2), PackOptions::default()).expect("pack");
        assert_eq!(msb, vec![0b1000_0011, 0x00]);
        let lsb = pack(
            &bits,
            layout(8, 2),
            PackOptions {
                lsb_first: true,
                ..Default::default()
            },
        )
        .expect("pack");
        assert_eq!(lsb, vec![0b1100_0001, 0x00]);
    }

    #[test]
    fn inversion_complements_before_packing() {
        let bits = BitMatrix::new(8, 1);
        let out = pack(
            &bits,
            layout(8, 1),
            PackOptions {
                inverted: true,
                ..Default::default()
            },
        )
        .expect("pack");
        assert_eq!(out, vec![0xff]);
    }

    #[test]
    fn group_order_is_column_major() {
        // Two groups of 8 columns, two rows. Only group 1 row 0 has its first bit set.
        let bits = row_pattern(16, 2, |c, r| c == 8 && r == 0);
        let out = pack(&bits, layout(8, 1), PackOptions::default()).expect("pack");
        // g0r0, g0r1, g1r0, g1r1
        assert_eq!(out, vec![0x00, 0x00, 0x80, 0x00]);
        let groups = split_groups(&out, 2);
        assert_eq!(groups, vec![&[0x00, 0x00][..], &[0x80, 0x00][..]]);
        let rows = byte_rows(&bits, layout(8, 1), PackOptions::default()).expect("rows");
        assert_eq!(rows, vec![vec![0x00, 0x80], vec![0x00, 0x00]]);
    }

    #[test]
    fn wide_groups_emit_several_bytes_per_row() {
        let bits = row_pattern(16, 1, |c, _| c == 15);
        let out = pack(&bits, layout(16, 1), PackOptions::default()).expect("pack");
        assert_eq!(out, vec![0x00, 0x01]);
    }

    #[test]
    fn non_multiple_of_eight_fails_fast() {
        let bits = BitMatrix::new(4, 1);
        assert!(matches!(
            pack(&bits, layout(4, 1), PackOptions::default()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn trailing_partial_group_is_ignored() {
        let bits = row_pattern(10, 1, |_, _| true);
        let out = pack(&bits, layout(8, 1), PackOptions::default()).expect("pack");
        assert_eq!(out, vec![0xff]);
    }

    #[test]
    fn unpack_inverts_pack_for_all_options() {
        let bits = row_pattern(16, 3, |c, r| (c * 7 + r * 3) % 5 < 2);
        for inverted in [false, true] {
            for lsb_first in [false, true] {
                let opts = PackOptions {
                    inverted,
                    lsb_first,
                };
                let packed = pack(&bits, layout(8, 3), opts).expect("pack");
                let back = unpack(&packed, 16, 3, layout(8, 3), opts).expect("unpack");
                assert_eq!(back, bits, "inverted={inverted} lsb_first={lsb_first}");
            }
        }
    }

    #[test]
    fn unpack_rejects_wrong_length() {
        assert!(matches!(
            unpack(&[0u8; 3], 8, 2, layout(8, 2), PackOptions::default()),
            Err(Error::DataShapeMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn text_export_inserts_separators() {
        let bits = row_pattern(4, 3, |c, r| c == r);
        let text = render_text(&bits, layout(2, 2));
        assert_eq!(text, "10 00\n01 00\n\n00 10\n");
        assert_eq!(parse_text(&text).expect("parse"), bits);
    }

    #[test]
    fn parse_text_rejects_ragged_rows() {
        assert!(parse_text("101\n10\n").is_err());
        assert!(parse_text("10x\n").is_err());
    }

    #[test]
    fn byte_row_formatting() {
        assert_eq!(format_byte_row(&[0xa1, 0x0f], false), "A1 0F ");
        assert_eq!(format_byte_row(&[0x05], true), "00000101 ");
    }
}
