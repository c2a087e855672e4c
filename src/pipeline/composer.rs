//! Pipeline composition.
//!
//! Resolves an ordered list of filter specs into one composite transform.
//! Step `n` consumes the output of step `n - 1`; the first step consumes the
//! original image. An empty pipeline is the identity.

use crate::core::param::ParamMap;
use crate::core::transform::{Category, FilterMetadata, Transform};
use crate::core::types::{FilterSpec, PipelineSpec, RawParams};
use crate::filters::registry::FilterRegistry;
use crate::pipeline::coercion::resolve_params;
use image::DynamicImage;
use std::sync::Arc;

/// One resolved step: a transform bound to its coerced parameters.
#[derive(Clone)]
pub struct Step {
    /// Name the step was requested under.
    pub name: String,
    /// Resolved transform (identity for unknown names).
    pub transform: Arc<dyn Transform>,
    /// Parameters resolved against the transform's schema.
    pub params: ParamMap,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("transform", &"<transform>")
            .field("params", &self.params)
            .finish()
    }
}

impl Step {
    /// Bind a transform to raw parameters, coercing them to its schema.
    pub fn bind(name: impl Into<String>, transform: Arc<dyn Transform>, raw: &RawParams) -> Self {
        let params = resolve_params(&transform.metadata(), raw);
        Self {
            name: name.into(),
            transform,
            params,
        }
    }
}

/// A left-to-right chain of resolved steps.
#[derive(Debug, Clone, Default)]
pub struct ComposedTransform {
    steps: Vec<Step>,
}

impl ComposedTransform {
    /// Create a chain from steps.
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Steps in application order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether this chain is the identity.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order. The input is never modified.
    pub fn run(&self, image: &DynamicImage) -> DynamicImage {
        let mut steps = self.steps.iter();
        let mut current = match steps.next() {
            Some(first) => first.transform.apply(image, &first.params),
            None => return image.clone(),
        };
        for step in steps {
            current = step.transform.apply(&current, &step.params);
        }
        current
    }
}

impl Transform for ComposedTransform {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Pipeline")
            .description(format!("{} step pipeline", self.steps.len()))
            .category(Category::Composite)
            .fixed_parameters()
            .build()
    }

    fn apply(&self, image: &DynamicImage, _params: &ParamMap) -> DynamicImage {
        self.run(image)
    }
}

/// Builds composite transforms from specs using a registry.
pub struct PipelineComposer<'a> {
    registry: &'a FilterRegistry,
}

impl<'a> PipelineComposer<'a> {
    /// Create a composer over a registry.
    pub fn new(registry: &'a FilterRegistry) -> Self {
        Self { registry }
    }

    /// Resolve one spec to a step. Unknown names resolve to the identity.
    pub fn resolve_step(&self, spec: &FilterSpec) -> Step {
        Step::bind(spec.name.clone(), self.registry.resolve(&spec.name), &spec.params)
    }

    /// Resolve a single named filter as a one-step chain.
    pub fn single(&self, spec: &FilterSpec) -> ComposedTransform {
        ComposedTransform::from_steps(vec![self.resolve_step(spec)])
    }

    /// Compose an ordered pipeline.
    pub fn compose(&self, pipeline: &PipelineSpec) -> ComposedTransform {
        ComposedTransform::from_steps(pipeline.steps().iter().map(|s| self.resolve_step(s)).collect())
    }
}
