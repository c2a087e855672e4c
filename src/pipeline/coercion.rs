//! Coercion of raw caller parameters into a filter's declared schema.
//!
//! Coercion never fails. Unknown keys are ignored, unparsable values fall
//! back to the declared default, and everything is clamped into range.

use crate::core::param::{ParamKind, ParamMap, ParamValue, ParameterDefinition};
use crate::core::transform::FilterMetadata;
use crate::core::types::RawParams;
use log::debug;

/// Coerce a single raw value to a declared parameter kind.
///
/// Integer fields are parsed as floats first and truncated toward zero, so
/// `"128.0"` becomes `128`.
pub fn coerce_value(definition: &ParameterDefinition, raw: f64) -> ParamValue {
    let value = match definition.kind {
        ParamKind::Integer => ParamValue::Integer(raw.trunc() as i64),
        ParamKind::Real => ParamValue::Real(raw),
    };
    definition.clamp(value)
}

/// Resolve raw parameters against a filter's schema.
pub fn resolve_params(metadata: &FilterMetadata, raw: &RawParams) -> ParamMap {
    if metadata.fixed_parameters {
        if !raw.is_empty() {
            debug!("'{}' uses fixed parameters, ignoring {} supplied", metadata.name, raw.len());
        }
        return ParamMap::defaults(&metadata.parameters);
    }

    let mut resolved = ParamMap::new();
    for definition in &metadata.parameters {
        let value = match raw.get(&definition.name) {
            Some(value) => match value.as_real() {
                Some(number) => coerce_value(definition, number),
                None => {
                    debug!(
                        "'{}': dropping unparsable value {:?} for '{}'",
                        metadata.name, value, definition.name
                    );
                    definition.default_value
                }
            },
            None => definition.default_value,
        };
        resolved.insert(definition.name.clone(), value);
    }

    for key in raw.keys() {
        if metadata.get_parameter(key).is_none() {
            debug!("'{}': ignoring unknown parameter '{}'", metadata.name, key);
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::Category;
    use crate::core::types::RawValue;

    fn adaptive() -> FilterMetadata {
        FilterMetadata::builder("Adaptive Threshold")
            .category(Category::Threshold)
            .parameter(ParameterDefinition::integer("blockSize", 11).with_range(3.0, 255.0).odd())
            .parameter(ParameterDefinition::real("C", 2.0))
            .build()
    }

    fn raw(pairs: &[(&str, RawValue)]) -> RawParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_missing_params_use_defaults() {
        let params = resolve_params(&adaptive(), &RawParams::new());
        assert_eq!(params.get("blockSize"), Some(ParamValue::Integer(11)));
        assert_eq!(params.get("C"), Some(ParamValue::Real(2.0)));
    }

    #[test]
    fn test_integer_from_real_text() {
        let params = resolve_params(&adaptive(), &raw(&[("blockSize", RawValue::from("15.0"))]));
        assert_eq!(params.get("blockSize"), Some(ParamValue::Integer(15)));
    }

    #[test]
    fn test_unparsable_falls_back_to_default() {
        let params = resolve_params(
            &adaptive(),
            &raw(&[("blockSize", RawValue::from("big")), ("C", RawValue::Null)]),
        );
        assert_eq!(params.get("blockSize"), Some(ParamValue::Integer(11)));
        assert_eq!(params.get("C"), Some(ParamValue::Real(2.0)));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let params = resolve_params(&adaptive(), &raw(&[("gamma", RawValue::Number(3.0))]));
        assert_eq!(params.len(), 2);
        assert!(params.get("gamma").is_none());
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let params = resolve_params(&adaptive(), &raw(&[("blockSize", RawValue::Number(-7.0))]));
        assert_eq!(params.get("blockSize"), Some(ParamValue::Integer(3)));
    }

    #[test]
    fn test_fixed_parameters_ignore_input() {
        let metadata = FilterMetadata::builder("Auto Enhance").fixed_parameters().build();
        let params = resolve_params(&metadata, &raw(&[("gamma", RawValue::Number(9.0))]));
        assert!(params.is_empty());
    }
}
