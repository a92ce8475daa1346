//! Attribute validation for load payloads.
//!
//! Each mapper's attribute declarations compile into a JSON Schema; the
//! flat load input is validated against it and every violation is
//! collected, so the surrounding API layer can report all offending
//! fields at once.

use serde_json::{json, Map, Value};

use crate::error::{AttributeError, LoadError};
use crate::mappers::{AttrKind, AttrSpec};

/// Compile attribute declarations into a JSON Schema for load validation.
///
/// `dump_only` attributes are excluded from `required` (they are never
/// read from a payload) but keep their type constraint in case a client
/// echoes them back. Unknown members are allowed; the projection step
/// simply ignores them.
pub fn attributes_schema(attrs: &[AttrSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for spec in attrs {
        properties.insert(spec.name.to_string(), kind_schema(spec.kind));
        if spec.required && !spec.dump_only {
            required.push(Value::String(spec.name.to_string()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": true,
    })
}

fn kind_schema(kind: AttrKind) -> Value {
    match kind {
        AttrKind::Str => json!({ "type": "string" }),
        AttrKind::Bool => json!({ "type": "boolean" }),
        AttrKind::Int => json!({ "type": "integer" }),
        AttrKind::StrList => json!({ "type": "array", "items": { "type": "string" } }),
        AttrKind::IntList => json!({ "type": "array", "items": { "type": "integer" } }),
        AttrKind::Map => json!({ "type": "object" }),
    }
}

/// Validate a flat load input against the declared attributes.
///
/// # Errors
///
/// Returns `LoadError::Invalid` carrying one [`AttributeError`] per
/// violation, or `LoadError::InvalidSchema` if the compiled schema is
/// rejected by the validator (a declaration bug, not a caller error).
pub fn validate_attributes(attrs: &[AttrSpec], flat: &Map<String, Value>) -> Result<(), LoadError> {
    let schema = attributes_schema(attrs);
    let validator = jsonschema::validator_for(&schema).map_err(|e| LoadError::InvalidSchema {
        message: e.to_string(),
    })?;

    let input = Value::Object(flat.clone());
    let errors: Vec<AttributeError> = validator
        .iter_errors(&input)
        .map(|e| AttributeError {
            field: error_field(&e),
            reason: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LoadError::Invalid { errors })
    }
}

/// Name of the attribute a validation error points at. Required-property
/// violations carry the name in the error itself; everything else is
/// addressed by instance path.
fn error_field(error: &jsonschema::ValidationError<'_>) -> String {
    if let jsonschema::error::ValidationErrorKind::Required { property } = &error.kind {
        if let Some(name) = property.as_str() {
            return name.to_string();
        }
    }
    let path = error.instance_path.to_string();
    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::Mapper;
    use crate::types::ResourceType;

    fn flat(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn missing_required_attribute_is_reported_by_name() {
        let mapper = Mapper::new(ResourceType::Samples);
        let result = validate_attributes(mapper_attrs(&mapper), &flat(json!({"name": "home"})));

        match result {
            Err(LoadError::Invalid { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "url");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn wrong_type_is_reported_with_path() {
        let mapper = Mapper::new(ResourceType::Annotations);
        let result = validate_attributes(
            mapper_attrs(&mapper),
            &flat(json!({"attribute": "content", "tagid": "12"})),
        );

        match result {
            Err(LoadError::Invalid { errors }) => {
                assert!(errors.iter().any(|e| e.field == "tagid"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn all_violations_collected() {
        let mapper = Mapper::new(ResourceType::Annotations);
        let result = validate_attributes(mapper_attrs(&mapper), &flat(json!({})));

        match result {
            Err(LoadError::Invalid { errors }) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert!(fields.contains(&"attribute"));
                assert!(fields.contains(&"tagid"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn valid_input_passes() {
        let mapper = Mapper::new(ResourceType::Samples);
        let result = validate_attributes(
            mapper_attrs(&mapper),
            &flat(json!({"url": "http://example.com", "page_type": "item"})),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn unknown_members_are_allowed() {
        let mapper = Mapper::new(ResourceType::Samples);
        let result = validate_attributes(
            mapper_attrs(&mapper),
            &flat(json!({"url": "http://example.com", "custom": 1})),
        );
        assert!(result.is_ok());
    }

    // Read through the mapper so the tables stay the source of truth.
    fn mapper_attrs(mapper: &Mapper) -> &'static [AttrSpec] {
        mapper.attrs()
    }
}
