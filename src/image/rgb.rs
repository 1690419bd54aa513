//! Owned 8-bit RGB raster in row-major, channel-interleaved layout.
use serde::{Deserialize, Serialize};

/// Colour channel selected by the preprocessing mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Offset of the channel inside an RGB triple.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRgb8 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of bytes between consecutive rows (equals `3 * w`)
    pub stride: usize,
    /// Backing storage, `[r, g, b]` per pixel
    pub data: Vec<u8>,
}

impl ImageRgb8 {
    pub const CHANNELS: usize = 3;

    /// Construct a black buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, [0, 0, 0])
    }

    /// Construct a buffer where every pixel holds `rgb`.
    pub fn filled(w: usize, h: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(w * h * Self::CHANNELS);
        for _ in 0..w * h {
            data.extend_from_slice(&rgb);
        }
        Self {
            w,
            h,
            stride: w * Self::CHANNELS,
            data,
        }
    }

    /// Wrap raw interleaved RGB bytes. Returns `None` when the length does not
    /// match `w * h * 3`.
    pub fn from_raw(w: usize, h: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == w * h * Self::CHANNELS).then_some(Self {
            w,
            h,
            stride: w * Self::CHANNELS,
            data,
        })
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x * Self::CHANNELS
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        let i = self.idx(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = self.idx(x, y);
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// Sum of the three channel values at (x, y).
    #[inline]
    pub fn pixel_sum(&self, x: usize, y: usize) -> u32 {
        let i = self.idx(x, y);
        self.data[i] as u32 + self.data[i + 1] as u32 + self.data[i + 2] as u32
    }

    /// Sum of all channel values over the half-open box `[x0, x1) × [y0, y1)`.
    /// The box is clipped to the raster.
    pub fn box_sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> u64 {
        let x1 = x1.min(self.w);
        let y1 = y1.min(self.h);
        if x0 >= x1 || y0 >= y1 {
            return 0;
        }
        let mut total = 0u64;
        for y in y0..y1 {
            let start = self.idx(x0, y);
            let end = self.idx(x1 - 1, y) + Self::CHANNELS;
            total += self.data[start..end].iter().map(|&v| v as u64).sum::<u64>();
        }
        total
    }
}

impl crate::image::traits::ImageView for ImageRgb8 {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn channels(&self) -> usize {
        Self::CHANNELS
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w * Self::CHANNELS]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[u8]> {
        Some(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::ImageRgb8;

    #[test]
    fn box_sum_is_clipped_to_raster() {
        let img = ImageRgb8::filled(4, 3, [1, 2, 3]);
        assert_eq!(img.box_sum(0, 0, 4, 3), 12 * 6);
        assert_eq!(img.box_sum(2, 1, 100, 100), 4 * 6);
        assert_eq!(img.box_sum(3, 0, 3, 3), 0);
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(ImageRgb8::from_raw(2, 2, vec![0; 12]).is_some());
        assert!(ImageRgb8::from_raw(2, 2, vec![0; 11]).is_none());
    }
}
