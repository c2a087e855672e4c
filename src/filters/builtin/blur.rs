//! Blur filters: Gaussian, Median, Bilateral.
//!
//! These take no caller parameters; kernel sizes are fixed.

use crate::core::param::ParamMap;
use crate::core::transform::{Category, FilterMetadata, Transform};
use crate::filters::builtin::utility::{clamp_coord, par_rows, sigma_for_kernel};
use crate::filters::registry::FilterRegistry;
use image::DynamicImage;

/// Register blur filters.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(GaussianBlur);
    registry.register(MedianBlur);
    registry.register(BilateralFilter::default());
}

/// 5×5 Gaussian blur.
#[derive(Debug, Clone, Copy)]
pub struct GaussianBlur;

impl Transform for GaussianBlur {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Gaussian Blur")
            .description("Smooth the image with a 5x5 Gaussian kernel")
            .category(Category::Blur)
            .build()
    }

    fn apply(&self, image: &DynamicImage, _params: &ParamMap) -> DynamicImage {
        let rgb = image.to_rgb8();
        let blurred = imageproc::filter::gaussian_blur_f32(&rgb, sigma_for_kernel(5));
        DynamicImage::ImageRgb8(blurred)
    }
}

/// 5×5 median filter, per channel.
#[derive(Debug, Clone, Copy)]
pub struct MedianBlur;

impl Transform for MedianBlur {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Median Blur")
            .description("Replace each pixel with the median of its 5x5 neighbourhood")
            .category(Category::Blur)
            .build()
    }

    fn apply(&self, image: &DynamicImage, _params: &ParamMap) -> DynamicImage {
        let rgb = image.to_rgb8();
        DynamicImage::ImageRgb8(imageproc::filter::median_filter(&rgb, 2, 2))
    }
}

/// Edge-preserving bilateral filter.
#[derive(Debug, Clone, Copy)]
pub struct BilateralFilter {
    /// Neighbourhood diameter in pixels.
    pub diameter: u32,
    /// Range sigma (intensity distance).
    pub sigma_color: f32,
    /// Domain sigma (spatial distance).
    pub sigma_space: f32,
}

impl Default for BilateralFilter {
    fn default() -> Self {
        Self {
            diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

impl Transform for BilateralFilter {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Bilateral Filter")
            .description("Smooth flat regions while keeping edges (d=9, sigma 75/75)")
            .category(Category::Blur)
            .build()
    }

    fn apply(&self, image: &DynamicImage, _params: &ParamMap) -> DynamicImage {
        let src = image.to_rgb8();
        let (w, h) = src.dimensions();
        let radius = (self.diameter / 2) as i64;
        let color_coeff = -0.5 / (self.sigma_color * self.sigma_color);
        let space_coeff = -0.5 / (self.sigma_space * self.sigma_space);

        // Spatial weights only depend on the offset.
        let mut spatial = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let d2 = (dx * dx + dy * dy) as f32;
                if d2 <= (radius * radius) as f32 {
                    spatial.push((dx, dy, (d2 * space_coeff).exp()));
                }
            }
        }

        let out = par_rows(w, h, |y, row| {
            for x in 0..w {
                let center = src.get_pixel(x, y).0;
                let mut sum = [0f32; 3];
                let mut norm = 0f32;
                for &(dx, dy, ws) in &spatial {
                    let nx = clamp_coord(x as i64 + dx, w);
                    let ny = clamp_coord(y as i64 + dy, h);
                    let p = src.get_pixel(nx, ny).0;
                    let diff: f32 = (0..3).map(|c| (p[c] as f32 - center[c] as f32).abs()).sum();
                    let weight = ws * (diff * diff * color_coeff).exp();
                    for c in 0..3 {
                        sum[c] += p[c] as f32 * weight;
                    }
                    norm += weight;
                }
                let base = x as usize * 3;
                for c in 0..3 {
                    row[base + c] = (sum[c] / norm).round().clamp(0.0, 255.0) as u8;
                }
            }
        });

        DynamicImage::ImageRgb8(out)
    }
}
