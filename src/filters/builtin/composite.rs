//! Composite presets built from other built-in filters.

use crate::core::param::ParamMap;
use crate::core::transform::{Category, FilterMetadata, Transform};
use crate::core::types::{RawParams, RawValue};
use crate::filters::builtin::enhance::{GammaCorrection, NonLocalMeans, UnsharpMask};
use crate::filters::builtin::threshold::AdaptiveThreshold;
use crate::filters::registry::FilterRegistry;
use crate::pipeline::composer::{ComposedTransform, Step};
use image::DynamicImage;
use std::sync::Arc;

/// Register composite filters.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(AutoEnhance::new());
}

/// Fixed four-step document clean-up preset.
///
/// Runs gamma 1.2, non-local means (h = 10), unsharp mask (sigma 3,
/// strength 1) and an adaptive threshold (block 11, C = 2). Caller
/// parameters are always ignored, even when used as a pipeline step.
#[derive(Debug, Clone)]
pub struct AutoEnhance {
    chain: ComposedTransform,
}

impl AutoEnhance {
    /// Build the preset chain.
    pub fn new() -> Self {
        let fixed = |pairs: &[(&str, f64)]| -> RawParams {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), RawValue::Number(*v)))
                .collect()
        };

        let chain = ComposedTransform::from_steps(vec![
            Step::bind("Gamma Correction", Arc::new(GammaCorrection), &fixed(&[("gamma", 1.2)])),
            Step::bind(
                "Non-Local Means",
                Arc::new(NonLocalMeans::default()),
                &fixed(&[("hStrength", 10.0)]),
            ),
            Step::bind(
                "Unsharp Mask",
                Arc::new(UnsharpMask),
                &fixed(&[("sigma", 3.0), ("strength", 1.0)]),
            ),
            Step::bind(
                "Adaptive Threshold",
                Arc::new(AdaptiveThreshold),
                &fixed(&[("blockSize", 11.0), ("C", 2.0)]),
            ),
        ]);

        Self { chain }
    }

    /// The steps this preset runs.
    pub fn steps(&self) -> &ComposedTransform {
        &self.chain
    }
}

impl Default for AutoEnhance {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for AutoEnhance {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Auto Enhance")
            .description("Gamma, denoise, sharpen, then adaptive threshold with built-in settings")
            .category(Category::Composite)
            .fixed_parameters()
            .build()
    }

    fn apply(&self, image: &DynamicImage, _params: &ParamMap) -> DynamicImage {
        self.chain.run(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::param::ParamValue;
    use crate::core::types::FilterSpec;
    use crate::pipeline::composer::PipelineComposer;
    use image::{Rgb, RgbImage};

    fn page() -> DynamicImage {
        let mut img = RgbImage::from_pixel(24, 24, Rgb([210; 3]));
        for x in 8..16 {
            img.put_pixel(x, 12, Rgb([30; 3]));
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_step_order_and_params() {
        let preset = AutoEnhance::new();
        let names: Vec<&str> = preset.steps().steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Gamma Correction", "Non-Local Means", "Unsharp Mask", "Adaptive Threshold"]
        );
        let gamma = &preset.steps().steps()[0];
        assert_eq!(gamma.params.get("gamma"), Some(ParamValue::Real(1.2)));
        let unsharp = &preset.steps().steps()[2];
        assert_eq!(unsharp.params.get("strength"), Some(ParamValue::Real(1.0)));
    }

    #[test]
    fn test_output_is_binary() {
        let out = AutoEnhance::new().apply(&page(), &ParamMap::new()).to_rgb8();
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(out.get_pixel(12, 12)[0], 0);
        assert_eq!(out.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_external_params_ignored() {
        let mut registry = FilterRegistry::new();
        register(&mut registry);
        let composer = PipelineComposer::new(&registry);

        let plain = composer.single(&FilterSpec::new("Auto Enhance")).run(&page());
        let with_params = composer
            .single(&FilterSpec::new("Auto Enhance").with_param("gamma", 5.0).with_param("C", 40.0))
            .run(&page());
        assert_eq!(plain.as_bytes(), with_params.as_bytes());
    }
}
