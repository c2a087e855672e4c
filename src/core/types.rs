//! Core value types shared by the registry, composer, and workflow.
//!
//! Images themselves are plain [`image::DynamicImage`] buffers. Everything
//! here describes *which* image and *which* transform invocation is meant.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Stable identifier of an uploaded image.
///
/// Ids are `<uuid>_<sanitised file name>` so two uploads with the same
/// file name never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Create a fresh id for an upload with the given (sanitised) file name.
    pub fn generate(file_name: &str) -> Self {
        Self(format!("{}_{}", Uuid::new_v4(), file_name))
    }

    /// Wrap an existing id string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name the image was uploaded under, without the uuid prefix.
    pub fn display_name(&self) -> &str {
        match self.0.split_once('_') {
            Some((prefix, rest)) if Uuid::parse_str(prefix).is_ok() => rest,
            _ => &self.0,
        }
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Image file formats accepted at upload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Bmp,
    Unknown,
}

impl ImageFormat {
    /// Determine image format from file path extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "bmp" => ImageFormat::Bmp,
            _ => ImageFormat::Unknown,
        }
    }

    /// Convert to image crate's ImageFormat.
    pub fn to_image_format(&self) -> Option<image::ImageFormat> {
        match self {
            ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageFormat::Png => Some(image::ImageFormat::Png),
            ImageFormat::Bmp => Some(image::ImageFormat::Bmp),
            ImageFormat::Unknown => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Jpeg => write!(f, "JPEG"),
            ImageFormat::Png => write!(f, "PNG"),
            ImageFormat::Bmp => write!(f, "BMP"),
            ImageFormat::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A parameter value as submitted by a caller, before coercion.
///
/// Form fields arrive as text, JSON bodies as numbers; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Null,
}

impl RawValue {
    /// Interpret the value as a finite real number, if possible.
    pub fn as_real(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Null => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// Uncoerced parameters keyed by name, in submission order.
pub type RawParams = IndexMap<String, RawValue>;

/// One transform invocation: a filter name plus its raw parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Registry name, e.g. "Median Blur".
    #[serde(rename = "filterName", default = "none_filter")]
    pub name: String,
    /// Parameters for this step.
    #[serde(default)]
    pub params: RawParams,
}

fn none_filter() -> String {
    "None".to_string()
}

impl FilterSpec {
    /// Create a spec with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: RawParams::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Ordered list of filter steps, applied left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineSpec(pub Vec<FilterSpec>);

impl PipelineSpec {
    /// Create an empty (identity) pipeline.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a step.
    pub fn step(mut self, spec: FilterSpec) -> Self {
        self.0.push(spec);
        self
    }

    /// Steps in application order.
    pub fn steps(&self) -> &[FilterSpec] {
        &self.0
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this pipeline is the identity.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<FilterSpec>> for PipelineSpec {
    fn from(steps: Vec<FilterSpec>) -> Self {
        Self(steps)
    }
}

/// The spec last previewed on an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec", rename_all = "snake_case")]
pub enum AppliedSpec {
    /// Nothing previewed since upload.
    #[default]
    None,
    /// A single named filter.
    Filter(FilterSpec),
    /// A user-defined pipeline.
    Pipeline(PipelineSpec),
}

impl AppliedSpec {
    /// Name shown to callers: "None", the filter name, or "Pipeline".
    pub fn name(&self) -> &str {
        match self {
            AppliedSpec::None => "None",
            AppliedSpec::Filter(spec) => &spec.name,
            AppliedSpec::Pipeline(_) => "Pipeline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ids_are_unique_for_same_name() {
        let a = ImageId::generate("scan.png");
        let b = ImageId::generate("scan.png");
        assert_ne!(a, b);
        assert_eq!(a.display_name(), "scan.png");
        assert_eq!(b.display_name(), "scan.png");
    }

    #[test]
    fn test_display_name_without_uuid_prefix() {
        let id = ImageId::from_string("my_scan.png");
        assert_eq!(id.display_name(), "my_scan.png");
    }

    #[test]
    fn test_format_from_path_is_case_insensitive() {
        assert_eq!(ImageFormat::from_path(Path::new("a.PNG")), ImageFormat::Png);
        assert_eq!(ImageFormat::from_path(Path::new("a.JpEg")), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_path(Path::new("a.bmp")), ImageFormat::Bmp);
        assert_eq!(ImageFormat::from_path(Path::new("a.gif")), ImageFormat::Unknown);
        assert_eq!(ImageFormat::from_path(Path::new("noext")), ImageFormat::Unknown);
    }

    #[test]
    fn test_raw_value_parsing() {
        assert_eq!(RawValue::from("128.0").as_real(), Some(128.0));
        assert_eq!(RawValue::from(" 2 ").as_real(), Some(2.0));
        assert_eq!(RawValue::from("abc").as_real(), None);
        assert_eq!(RawValue::from("NaN").as_real(), None);
        assert_eq!(RawValue::Null.as_real(), None);
    }

    #[test]
    fn test_filter_spec_deserialize() {
        let json = r#"{"filterName": "Gamma Correction", "params": {"gamma": 1.2}}"#;
        let spec: FilterSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.name, "Gamma Correction");
        assert_eq!(spec.params.get("gamma"), Some(&RawValue::Number(1.2)));

        let spec: FilterSpec = serde_json::from_str(r#"{"params": {"threshold": "90"}}"#).unwrap();
        assert_eq!(spec.name, "None");
        assert_eq!(spec.params.get("threshold"), Some(&RawValue::Text("90".to_string())));
    }

    #[test]
    fn test_applied_spec_names() {
        assert_eq!(AppliedSpec::None.name(), "None");
        assert_eq!(AppliedSpec::Filter(FilterSpec::new("CLAHE")).name(), "CLAHE");
        assert_eq!(AppliedSpec::Pipeline(PipelineSpec::new()).name(), "Pipeline");
    }
}
