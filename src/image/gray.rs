//! Owned single-channel 8-bit raster (masks and debug output).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageGray8 {
    pub w: usize,
    pub h: usize,
    pub stride: usize,
    pub data: Vec<u8>,
}

impl ImageGray8 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0; w * h],
        }
    }
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Paint a filled disc, clipped to the raster.
    pub fn fill_disc(&mut self, cx: usize, cy: usize, radius: usize, v: u8) {
        let r = radius as i64;
        let (cx, cy) = (cx as i64, cy as i64);
        for dy in -r..=r {
            let y = cy + dy;
            if y < 0 || y >= self.h as i64 {
                continue;
            }
            for dx in -r..=r {
                let x = cx + dx;
                if x < 0 || x >= self.w as i64 || dx * dx + dy * dy > r * r {
                    continue;
                }
                self.set(x as usize, y as usize, v);
            }
        }
    }
}

impl crate::image::traits::ImageView for ImageGray8 {
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
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[u8]> {
        (self.stride == self.w).then_some(&self.data[..self.w * self.h])
    }
}
