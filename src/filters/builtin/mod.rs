//! Built-in filter implementations.
//!
//! This module contains the standard filters that ship with Retouch.

mod blur;
mod composite;
mod enhance;
mod threshold;
pub(crate) mod utility;

use crate::filters::registry::FilterRegistry;

/// Register all built-in filters.
pub fn register_all(registry: &mut FilterRegistry) {
    utility::register(registry);
    blur::register(registry);
    threshold::register(registry);
    enhance::register(registry);
    composite::register(registry);
}

// Re-export for direct access
pub use blur::{BilateralFilter, GaussianBlur, MedianBlur};
pub use composite::AutoEnhance;
pub use enhance::{Clahe, GammaCorrection, NonLocalMeans, UnsharpMask};
pub use threshold::{AdaptiveThreshold, ManualThreshold, OtsuThreshold};
