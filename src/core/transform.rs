//! The Transform trait and filter metadata.
//!
//! A transform is a pure function `Image × Params → Image`. It never
//! mutates its input; every call returns a fresh buffer.

use crate::core::param::{ParamMap, ParameterDefinition};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category for organizing filters in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Smoothing filters
    Blur,
    /// Binarisation
    Threshold,
    /// Denoising
    Noise,
    /// Contrast and tone adjustments
    Adjust,
    /// Sharpening
    Sharpen,
    /// Fixed multi-step presets
    Composite,
    /// Utility transforms
    #[default]
    Utility,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Blur => "Blur",
            Category::Threshold => "Threshold",
            Category::Noise => "Noise",
            Category::Adjust => "Adjust",
            Category::Sharpen => "Sharpen",
            Category::Composite => "Composite",
            Category::Utility => "Utility",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Metadata describing a registered filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterMetadata {
    /// Registry name (e.g., "Gaussian Blur")
    pub name: String,
    /// Category for listings
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Declared parameters
    pub parameters: Vec<ParameterDefinition>,
    /// Caller-supplied parameters are ignored entirely (fixed presets).
    pub fixed_parameters: bool,
}

impl FilterMetadata {
    /// Create a new metadata builder.
    pub fn builder(name: impl Into<String>) -> FilterMetadataBuilder {
        FilterMetadataBuilder::new(name)
    }

    /// Get all parameter names.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Find a parameter by name.
    pub fn get_parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Builder for FilterMetadata.
pub struct FilterMetadataBuilder {
    name: String,
    category: Category,
    description: String,
    parameters: Vec<ParameterDefinition>,
    fixed_parameters: bool,
}

impl FilterMetadataBuilder {
    /// Create a new builder with the registry name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: Category::default(),
            description: String::new(),
            parameters: Vec::new(),
            fixed_parameters: false,
        }
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare a parameter.
    pub fn parameter(mut self, parameter: ParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Ignore all caller-supplied parameters.
    pub fn fixed_parameters(mut self) -> Self {
        self.fixed_parameters = true;
        self
    }

    /// Build the metadata.
    pub fn build(self) -> FilterMetadata {
        FilterMetadata {
            name: self.name,
            category: self.category,
            description: self.description,
            parameters: self.parameters,
            fixed_parameters: self.fixed_parameters,
        }
    }
}

/// A pure image transform.
///
/// Implementations read their parameters from `params`, which the composer
/// has already resolved against [`Transform::metadata`]: every declared
/// parameter is present, typed and clamped.
pub trait Transform: Send + Sync {
    /// Describe this transform and its parameter schema.
    fn metadata(&self) -> FilterMetadata;

    /// Apply the transform, returning a new image.
    fn apply(&self, image: &DynamicImage, params: &ParamMap) -> DynamicImage;
}

/// The identity transform. Also the fallback for unknown filter names.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("None")
            .description("Return an unchanged copy of the image")
            .category(Category::Utility)
            .build()
    }

    fn apply(&self, image: &DynamicImage, _params: &ParamMap) -> DynamicImage {
        image.clone()
    }
}
