//! Per-intersection bit classification.
//!
//! Each intersection is sampled over a square box of half-width
//! `radius / 2` (integer division) in the preprocessed raster. The displayed
//! aperture is a circle, but the sum is taken over the box. A bit is set when
//! the box sum strictly exceeds `radius² * 255 / bit_thresh_div`, where
//! `radius² * 255` is what a fully saturated single-channel window of side
//! `radius` sums to.
use crate::bits::BitMatrix;
use crate::config::DecodeConfig;
use crate::error::{Error, Result};
use crate::grid::GridLines;
use crate::image::ImageRgb8;
use crate::raster::window_sum;
use crate::types::ImgXY;
use log::debug;
use serde::Serialize;

/// Sampling window and decision threshold derived from the configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aperture {
    pub radius: u32,
    pub bit_thresh_div: u32,
}

impl Aperture {
    pub fn from_config(cfg: &DecodeConfig) -> Result<Self> {
        if cfg.bit_thresh_div == 0 {
            return Err(Error::Config("bit_thresh_div must be at least 1".into()));
        }
        Ok(Self {
            radius: cfg.radius,
            bit_thresh_div: cfg.bit_thresh_div,
        })
    }

    /// Sum of a fully saturated window.
    pub fn max_value(&self) -> u64 {
        let r = self.radius as u64;
        r * r * 255
    }

    pub fn threshold(&self) -> f64 {
        self.max_value() as f64 / self.bit_thresh_div as f64
    }

    /// Half-width of the sampling box.
    pub fn half(&self) -> usize {
        (self.radius / 2) as usize
    }

    pub fn is_set(&self, sum: u64) -> bool {
        sum as f64 > self.threshold()
    }
}

/// Summary of one classification pass.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyStats {
    pub intersections: usize,
    pub ones: usize,
    pub max_aperture_value: u64,
    pub threshold: f64,
}

/// Classify a single intersection.
pub fn classify_cell(target: &ImageRgb8, center: ImgXY, aperture: &Aperture) -> bool {
    aperture.is_set(window_sum(target, center, aperture.half()))
}

/// Classify every intersection of `lines` against `target`. Always a full
/// re-scan; the result replaces any previous matrix wholesale.
pub fn classify_all(
    target: &ImageRgb8,
    lines: &GridLines,
    aperture: &Aperture,
) -> Result<(BitMatrix, ClassifyStats)> {
    let (cols, rows) = lines.shape();
    debug!(
        "classify: {}x{} intersections, max aperture value {}, threshold {:.1}",
        cols,
        rows,
        aperture.max_value(),
        aperture.threshold()
    );
    let mut data = Vec::with_capacity(cols * rows);
    for &x in lines.columns() {
        for &y in lines.rows() {
            data.push(classify_cell(target, ImgXY::new(x, y), aperture));
        }
    }
    let bits = BitMatrix::from_bits(cols, rows, data)?;
    let stats = ClassifyStats {
        intersections: bits.len(),
        ones: bits.count_ones(),
        max_aperture_value: aperture.max_value(),
        threshold: aperture.threshold(),
    };
    Ok((bits, stats))
}
