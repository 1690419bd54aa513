//! Per-channel raster primitives used by the preprocessing pipeline:
//! binary threshold, channel isolation, 3×3 dilation and erosion.
use super::rgb::{Channel, ImageRgb8};

/// Binary threshold: every sample `> thresh` becomes 255, everything else 0.
pub fn threshold_binary(src: &ImageRgb8, thresh: u8) -> ImageRgb8 {
    let data = src
        .data
        .iter()
        .map(|&v| if v > thresh { 0xff } else { 0 })
        .collect();
    ImageRgb8 {
        w: src.w,
        h: src.h,
        stride: src.stride,
        data,
    }
}

/// Zero every channel except `keep`.
pub fn isolate_channel(img: &mut ImageRgb8, keep: Channel) {
    let keep = keep.index();
    for px in img.data.chunks_exact_mut(ImageRgb8::CHANNELS) {
        for (c, v) in px.iter_mut().enumerate() {
            if c != keep {
                *v = 0;
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Morph {
    Dilate,
    Erode,
}

/// Apply a 3×3 rectangular dilation `iterations` times.
pub fn dilate(img: &ImageRgb8, iterations: u32) -> ImageRgb8 {
    repeat(img, iterations, Morph::Dilate)
}

/// Apply a 3×3 rectangular erosion `iterations` times.
pub fn erode(img: &ImageRgb8, iterations: u32) -> ImageRgb8 {
    repeat(img, iterations, Morph::Erode)
}

fn repeat(img: &ImageRgb8, iterations: u32, op: Morph) -> ImageRgb8 {
    let mut cur = img.clone();
    for _ in 0..iterations {
        cur = morph_3x3(&cur, op);
    }
    cur
}

/// Neighbours outside the raster are ignored.
fn morph_3x3(src: &ImageRgb8, op: Morph) -> ImageRgb8 {
    let mut out = ImageRgb8::new(src.w, src.h);
    for y in 0..src.h {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(src.h - 1);
        for x in 0..src.w {
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(src.w - 1);
            let mut acc = match op {
                Morph::Dilate => [0u8; 3],
                Morph::Erode => [0xffu8; 3],
            };
            for ny in y0..=y1 {
                for nx in x0..=x1 {
                    let px = src.get(nx, ny);
                    for c in 0..ImageRgb8::CHANNELS {
                        acc[c] = match op {
                            Morph::Dilate => acc[c].max(px[c]),
                            Morph::Erode => acc[c].min(px[c]),
                        };
                    }
                }
            }
            out.set(x, y, acc);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_dot(w: usize, h: usize, x: usize, y: usize) -> ImageRgb8 {
        let mut img = ImageRgb8::new(w, h);
        img.set(x, y, [255, 0, 0]);
        img
    }

    #[test]
    fn threshold_is_strict() {
        let img = ImageRgb8::filled(2, 1, [0xae, 0xaf, 0x10]);
        let out = threshold_binary(&img, 0xae);
        assert_eq!(out.get(0, 0), [0, 0xff, 0]);
    }

    #[test]
    fn isolate_keeps_only_selected_channel() {
        let mut img = ImageRgb8::filled(1, 1, [1, 2, 3]);
        isolate_channel(&mut img, Channel::Blue);
        assert_eq!(img.get(0, 0), [0, 0, 3]);
    }

    #[test]
    fn dilate_grows_dot_to_3x3() {
        let out = dilate(&single_dot(5, 5, 2, 2), 1);
        let lit = (0..5)
            .flat_map(|y| (0..5).map(move |x| (x, y)))
            .filter(|&(x, y)| out.get(x, y)[0] == 255)
            .count();
        assert_eq!(lit, 9);
        assert_eq!(out.get(1, 1)[0], 255);
        assert_eq!(out.get(0, 0)[0], 0);
    }

    #[test]
    fn erode_removes_isolated_dot_and_undoes_dilation() {
        let dot = single_dot(7, 7, 3, 3);
        assert_eq!(erode(&dot, 1).get(3, 3)[0], 0);
        let grown = dilate(&dot, 1);
        let back = erode(&grown, 1);
        assert_eq!(back.get(3, 3)[0], 255);
        assert_eq!(back.get(2, 3)[0], 0);
    }

    #[test]
    fn dot_at_corner_dilates_inside_raster() {
        let out = dilate(&single_dot(3, 3, 0, 0), 1);
        assert_eq!(out.get(1, 1)[0], 255);
        assert_eq!(out.get(2, 2)[0], 0);
    }
}
