//! Source photograph and the derived "target" raster the decoder reads.
//!
//! Preprocessing runs in a fixed order against the original:
//! threshold → channel isolation → dilation → erosion. The result is cached
//! and only rebuilt when one of the parameters feeding it changes.
use crate::config::DecodeConfig;
use crate::error::{Error, Result};
use crate::grid::GridLines;
use crate::image::io::load_rgb_image;
use crate::image::morph::{dilate, erode, isolate_channel, threshold_binary};
use crate::image::{Channel, ImageGray8, ImageRgb8, ImageView};
use crate::types::ImgXY;
use log::debug;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// The subset of [`DecodeConfig`] that shapes the target raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreprocessParams {
    pub threshold: bool,
    pub pix_thresh_min: u8,
    pub channel: Channel,
    pub dilate: u32,
    pub erode: u32,
}

impl From<&DecodeConfig> for PreprocessParams {
    fn from(cfg: &DecodeConfig) -> Self {
        Self {
            threshold: cfg.threshold,
            pix_thresh_min: cfg.pix_thresh_min,
            channel: cfg.channel,
            dilate: cfg.dilate,
            erode: cfg.erode,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RasterBuffers {
    source: Option<PathBuf>,
    original: ImageRgb8,
    target: ImageRgb8,
    applied: Option<PreprocessParams>,
}

impl RasterBuffers {
    /// Decode the photograph at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let original = load_rgb_image(path)?;
        if original.w == 0 || original.h == 0 {
            return Err(Error::ImageLoad {
                path: path.to_path_buf(),
                reason: "image is empty".to_string(),
            });
        }
        debug!(
            "loaded {} ({}x{})",
            path.display(),
            original.w,
            original.h
        );
        let mut buffers = Self::from_image(original);
        buffers.source = Some(path.to_path_buf());
        Ok(buffers)
    }

    /// Wrap an in-memory raster. The target starts as a copy of it.
    pub fn from_image(original: ImageRgb8) -> Self {
        Self {
            source: None,
            target: original.clone(),
            original,
            applied: None,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn width(&self) -> usize {
        self.original.w
    }

    pub fn height(&self) -> usize {
        self.original.h
    }

    pub fn original(&self) -> &ImageRgb8 {
        &self.original
    }

    pub fn target(&self) -> &ImageRgb8 {
        &self.target
    }

    pub fn contains(&self, xy: ImgXY) -> bool {
        self.original.contains(xy.x, xy.y)
    }

    /// Rebuild the target raster if the parameters differ from the last run.
    pub fn preprocess(&mut self, params: PreprocessParams) -> &ImageRgb8 {
        if self.applied == Some(params) {
            return &self.target;
        }
        let start = Instant::now();
        let mut target = if params.threshold {
            let mut t = threshold_binary(&self.original, params.pix_thresh_min);
            isolate_channel(&mut t, params.channel);
            t
        } else {
            self.original.clone()
        };
        if params.dilate > 0 {
            target = dilate(&target, params.dilate);
        }
        if params.erode > 0 {
            target = erode(&target, params.erode);
        }
        self.target = target;
        self.applied = Some(params);
        debug!(
            "preprocess {:?} in {:.3} ms",
            params,
            start.elapsed().as_secs_f64() * 1000.0
        );
        &self.target
    }

    /// Sum of the target's channel values at `xy`; non-zero means occupied.
    pub fn pixel_intensity(&self, xy: ImgXY) -> Result<u32> {
        if !self.contains(xy) {
            return Err(Error::OutsideImage {
                x: xy.x,
                y: xy.y,
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(self.target.pixel_sum(xy.x, xy.y))
    }

    /// Target sum over the box `[x - half, x + half) × [y - half, y + half)`,
    /// clipped to the raster.
    pub fn window_sum(&self, center: ImgXY, half: usize) -> u64 {
        window_sum(&self.target, center, half)
    }

    /// Mask that is 255 inside a disc of `radius + 1` around every
    /// intersection. Display aid for the viewer's peephole mode.
    pub fn peephole_mask(&self, lines: &GridLines, radius: u32) -> ImageGray8 {
        let mut mask = ImageGray8::new(self.width(), self.height());
        for &x in lines.columns() {
            for &y in lines.rows() {
                mask.fill_disc(x, y, radius as usize + 1, 0xff);
            }
        }
        mask
    }
}

pub(crate) fn window_sum(target: &ImageRgb8, center: ImgXY, half: usize) -> u64 {
    target.box_sum(
        center.x.saturating_sub(half),
        center.y.saturating_sub(half),
        center.x + half,
        center.y + half,
    )
}
