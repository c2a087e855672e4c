//! Utility filters and shared pixel helpers.

use crate::core::transform::Identity;
use crate::filters::registry::FilterRegistry;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use rayon::prelude::*;

/// Register utility filters.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(Identity);
}

/// Conventional Gaussian sigma for an odd kernel size: `0.3 * ((k - 1) / 2 - 1) + 0.8`.
pub(crate) fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Expand a single-channel image back to three identical channels.
pub(crate) fn gray_to_rgb(gray: &GrayImage) -> DynamicImage {
    let (w, h) = gray.dimensions();
    let rgb = RgbImage::from_fn(w, h, |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });
    DynamicImage::ImageRgb8(rgb)
}

/// Binarise: 255 where the pixel is strictly above `level`, else 0.
pub(crate) fn binarize(gray: &GrayImage, level: u8) -> GrayImage {
    let mut out = gray.clone();
    for px in out.pixels_mut() {
        px[0] = if px[0] > level { 255 } else { 0 };
    }
    out
}

/// Build an RGB image row by row in parallel.
///
/// `fill(y, row)` receives the output row `y` as a `width * 3` byte slice.
pub(crate) fn par_rows<F>(width: u32, height: u32, fill: F) -> RgbImage
where
    F: Fn(u32, &mut [u8]) + Send + Sync,
{
    let mut out = RgbImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }
    let row_len = width as usize * 3;
    out.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| fill(y as u32, row));
    out
}

/// Clamp a signed coordinate into `[0, len)`.
#[inline]
pub(crate) fn clamp_coord(v: i64, len: u32) -> u32 {
    v.clamp(0, len as i64 - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_sigma_for_kernel() {
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-6);
        assert!((sigma_for_kernel(3) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_binarize_is_strict() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([[99, 100, 101][x as usize]]));
        let out = binarize(&gray, 100);
        assert_eq!(out.as_raw(), &vec![0, 0, 255]);
    }

    #[test]
    fn test_gray_to_rgb() {
        let gray = GrayImage::from_pixel(2, 2, Luma([77]));
        let rgb = gray_to_rgb(&gray).to_rgb8();
        assert!(rgb.pixels().all(|p| p.0 == [77, 77, 77]));
    }

    #[test]
    fn test_par_rows_fills_every_row() {
        let img = par_rows(4, 3, |y, row| row.iter_mut().for_each(|b| *b = y as u8));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(3, 2).0, [2, 2, 2]);
        assert_eq!(par_rows(0, 5, |_, _| {}).dimensions(), (0, 5));
    }

    #[test]
    fn test_clamp_coord() {
        assert_eq!(clamp_coord(-3, 10), 0);
        assert_eq!(clamp_coord(12, 10), 9);
        assert_eq!(clamp_coord(4, 10), 4);
    }
}
