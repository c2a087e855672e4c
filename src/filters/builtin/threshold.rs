//! Threshold filters: Manual, Otsu, Adaptive.
//!
//! All three work on the luminance channel and return a binary image
//! (0 or 255) expanded back to three channels.

use crate::core::param::{ParamMap, ParameterDefinition};
use crate::core::transform::{Category, FilterMetadata, Transform};
use crate::filters::builtin::utility::{binarize, gray_to_rgb, sigma_for_kernel};
use crate::filters::registry::FilterRegistry;
use image::{DynamicImage, GrayImage, Luma};

/// Register threshold filters.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(ManualThreshold);
    registry.register(OtsuThreshold);
    registry.register(AdaptiveThreshold);
}

/// Binarise at a caller-chosen level.
#[derive(Debug, Clone, Copy)]
pub struct ManualThreshold;

impl Transform for ManualThreshold {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Manual Threshold")
            .description("Binarise at a fixed gray level")
            .category(Category::Threshold)
            .parameter(
                ParameterDefinition::integer("threshold", 128)
                    .with_description("Pixels brighter than this become white")
                    .with_range(0.0, 255.0),
            )
            .build()
    }

    fn apply(&self, image: &DynamicImage, params: &ParamMap) -> DynamicImage {
        let level = params.integer("threshold", 128).clamp(0, 255) as u8;
        gray_to_rgb(&binarize(&image.to_luma8(), level))
    }
}

/// Binarise at the level chosen by Otsu's method.
#[derive(Debug, Clone, Copy)]
pub struct OtsuThreshold;

impl Transform for OtsuThreshold {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Otsu Threshold")
            .description("Binarise at the level that best separates the histogram")
            .category(Category::Threshold)
            .build()
    }

    fn apply(&self, image: &DynamicImage, _params: &ParamMap) -> DynamicImage {
        let gray = image.to_luma8();
        let level = imageproc::contrast::otsu_level(&gray);
        gray_to_rgb(&binarize(&gray, level))
    }
}

/// Binarise against a Gaussian-weighted local mean.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveThreshold;

impl AdaptiveThreshold {
    /// Threshold a gray image with the given odd block size and offset.
    pub fn threshold(gray: &GrayImage, block_size: u32, c: f64) -> GrayImage {
        let local_mean = imageproc::filter::gaussian_blur_f32(gray, sigma_for_kernel(block_size));
        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let src = gray.get_pixel(x, y)[0] as f64;
            let mean = local_mean.get_pixel(x, y)[0] as f64;
            if src > mean - c {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

impl Transform for AdaptiveThreshold {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Adaptive Threshold")
            .description("Binarise each pixel against its neighbourhood mean")
            .category(Category::Threshold)
            .parameter(
                ParameterDefinition::integer("blockSize", 11)
                    .with_description("Odd neighbourhood size")
                    .with_range(3.0, 255.0)
                    .odd(),
            )
            .parameter(
                ParameterDefinition::real("C", 2.0)
                    .with_description("Constant subtracted from the local mean"),
            )
            .build()
    }

    fn apply(&self, image: &DynamicImage, params: &ParamMap) -> DynamicImage {
        let block_size = params.integer("blockSize", 11).max(3) as u32;
        let c = params.real("C", 2.0);
        gray_to_rgb(&Self::threshold(&image.to_luma8(), block_size, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::param::ParamValue;
    use image::{Rgb, RgbImage};

    fn gradient() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(16, 4, |x, _| {
            let v = (x * 16) as u8;
            Rgb([v, v, v])
        }))
    }

    fn is_binary(image: &DynamicImage) -> bool {
        image.to_rgb8().pixels().all(|p| {
            p[0] == p[1] && p[1] == p[2] && (p[0] == 0 || p[0] == 255)
        })
    }

    #[test]
    fn test_manual_threshold_level() {
        let params = ParamMap::new().with("threshold", ParamValue::Integer(100));
        let out = ManualThreshold.apply(&gradient(), &params).to_rgb8();
        assert!(is_binary(&DynamicImage::ImageRgb8(out.clone())));
        // x * 16: 96 at x=6, 112 at x=7
        assert_eq!(out.get_pixel(6, 0)[0], 0);
        assert_eq!(out.get_pixel(7, 0)[0], 255);
    }

    #[test]
    fn test_otsu_splits_bimodal() {
        let img = RgbImage::from_fn(10, 2, |x, _| if x < 5 { Rgb([30; 3]) } else { Rgb([220; 3]) });
        let out = OtsuThreshold
            .apply(&DynamicImage::ImageRgb8(img), &ParamMap::new())
            .to_rgb8();
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(9, 0)[0], 255);
    }

    #[test]
    fn test_otsu_output_is_binary() {
        let out = OtsuThreshold.apply(&gradient(), &ParamMap::new());
        assert!(is_binary(&out));
    }

    #[test]
    fn test_adaptive_uniform_is_white() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 12, Rgb([128; 3])));
        let params = ParamMap::new()
            .with("blockSize", ParamValue::Integer(11))
            .with("C", ParamValue::Real(2.0));
        let out = AdaptiveThreshold.apply(&img, &params);
        assert!(out.to_rgb8().pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_adaptive_marks_dark_dot() {
        let mut img = RgbImage::from_pixel(15, 15, Rgb([200; 3]));
        img.put_pixel(7, 7, Rgb([20; 3]));
        let out = AdaptiveThreshold
            .apply(&DynamicImage::ImageRgb8(img), &ParamMap::new())
            .to_rgb8();
        assert_eq!(out.get_pixel(7, 7)[0], 0);
        assert_eq!(out.get_pixel(0, 0)[0], 255);
    }
}
