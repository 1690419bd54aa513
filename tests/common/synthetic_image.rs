use rom_grid::image::ImageRgb8;

/// Lit cell colour: red well above the default 0xae cutoff, green and blue
/// below it, like the reddish sheen of a stained ROM array.
pub const LIT: [u8; 3] = [230, 120, 60];
pub const BACKGROUND: [u8; 3] = [40, 30, 30];

/// A regular array of square dots, one per memory cell.
#[derive(Clone, Copy, Debug)]
pub struct DotArray {
    pub origin: (usize, usize),
    pub pitch: usize,
    /// Dot side in pixels. Odd sizes centre exactly on the cell position.
    pub dot: usize,
    pub cols: usize,
    pub rows: usize,
    pub margin: usize,
}

impl DotArray {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            origin: (20, 20),
            pitch: 12,
            dot: 5,
            cols,
            rows,
            margin: 20,
        }
    }

    pub fn center(&self, col: usize, row: usize) -> (usize, usize) {
        (
            self.origin.0 + col * self.pitch,
            self.origin.1 + row * self.pitch,
        )
    }

    pub fn width(&self) -> usize {
        self.origin.0 + (self.cols - 1) * self.pitch + self.margin
    }

    pub fn height(&self) -> usize {
        self.origin.1 + (self.rows - 1) * self.pitch + self.margin
    }

    /// Draw a dot wherever `bit(col, row)` is true.
    pub fn render(&self, bit: impl Fn(usize, usize) -> bool) -> ImageRgb8 {
        assert!(self.cols > 0 && self.rows > 0, "array must not be empty");
        let mut img = ImageRgb8::filled(self.width(), self.height(), BACKGROUND);
        let half = self.dot / 2;
        for col in 0..self.cols {
            for row in 0..self.rows {
                if !bit(col, row) {
                    continue;
                }
                let (cx, cy) = self.center(col, row);
                for y in cy - half..cy - half + self.dot {
                    for x in cx - half..cx - half + self.dot {
                        img.set(x, y, LIT);
                    }
                }
            }
        }
        img
    }
}

/// Deterministic pseudo-random bit pattern.
pub fn pattern(col: usize, row: usize) -> bool {
    (col * 7 + row * 13 + (col * row) % 5) % 3 == 0
}
