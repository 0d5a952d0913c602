//! Structural validation of externally supplied record batches.
//!
//! Validation is all-or-nothing: the first non-conforming element rejects the
//! whole batch, and the caller never sees a partially converted list.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::period::Period;
use crate::record::MetricRecord;

/// Which record schema a batch is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schema {
    /// Records without sections; any `section` field is carried but not checked.
    Flat,
    /// Records with sections; a present `section` must be non-empty text.
    #[default]
    Sectioned,
}

/// Why a batch was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The payload is not a JSON array.
    #[error("expected an array of metrics")]
    NotAnArray,

    /// An element is not a JSON object.
    #[error("element {index}: expected an object")]
    NotAnObject {
        /// Zero-based element position.
        index: usize,
    },

    /// An element field failed its check.
    #[error("element {index}: field '{field}' {reason}")]
    Field {
        /// Zero-based element position.
        index: usize,
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ValidationError {
    fn field(index: usize, field: &'static str, reason: impl Into<String>) -> Self {
        Self::Field {
            index,
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a candidate batch and convert it to records.
///
/// Field values are kept verbatim (no trimming) so that an exported
/// collection re-imports as an equal collection.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found; no records are returned in
/// that case.
pub fn validate(
    candidate: &Value,
    schema: Schema,
) -> std::result::Result<Vec<MetricRecord>, ValidationError> {
    let elements = candidate.as_array().ok_or(ValidationError::NotAnArray)?;
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let object = element
                .as_object()
                .ok_or(ValidationError::NotAnObject { index })?;
            validate_element(index, object, schema)
        })
        .collect()
}

fn validate_element(
    index: usize,
    object: &Map<String, Value>,
    schema: Schema,
) -> std::result::Result<MetricRecord, ValidationError> {
    let name = required_text(index, object, "name")?;
    if name.trim().is_empty() {
        return Err(ValidationError::field(index, "name", "must not be blank"));
    }

    let value = required_text(index, object, "value")?;
    if value.trim().is_empty() {
        return Err(ValidationError::field(index, "value", "must not be blank"));
    }

    let period_text = required_text(index, object, "period")?;
    let period = Period::parse(period_text).map_err(|_| {
        ValidationError::field(
            index,
            "period",
            format!("'{period_text}' is not a YYYY-MM period with month 01-12"),
        )
    })?;

    let section = match (schema, object.get("section")) {
        (_, None | Some(Value::Null)) => None,
        (Schema::Sectioned, Some(Value::String(s))) if s.trim().is_empty() => {
            return Err(ValidationError::field(index, "section", "must not be blank"));
        }
        // A blank tag belongs to the fallback bucket, like an absent one.
        (Schema::Flat, Some(Value::String(s))) if s.trim().is_empty() => None,
        (_, Some(Value::String(s))) => Some(s.clone()),
        (Schema::Sectioned, Some(_)) => {
            return Err(ValidationError::field(index, "section", "must be text"));
        }
        (Schema::Flat, Some(_)) => None,
    };

    let template = match object.get("template") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ValidationError::field(index, "template", "must be text")),
    };

    Ok(MetricRecord {
        name: name.to_string(),
        value: value.to_string(),
        period,
        section,
        template,
    })
}

fn required_text<'a>(
    index: usize,
    object: &'a Map<String, Value>,
    field: &'static str,
) -> std::result::Result<&'a str, ValidationError> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::field(index, field, "must be text")),
        None => Err(ValidationError::field(index, field, "is missing")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_batch() {
        let candidate = json!([
            {"name": "Выручка", "value": "100", "period": "2026-02"},
            {"name": "KPI", "value": "5%", "period": "2025-12", "section": "HR", "template": "hr.docx"},
        ]);
        let records = validate(&candidate, Schema::Sectioned).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Выручка");
        assert_eq!(records[1].section(), Some("HR"));
        assert_eq!(records[1].template.as_deref(), Some("hr.docx"));
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(validate(&json!([]), Schema::Sectioned).unwrap().is_empty());
    }

    #[test]
    fn test_not_an_array() {
        let err = validate(&json!({"name": "x"}), Schema::Sectioned).unwrap_err();
        assert_eq!(err, ValidationError::NotAnArray);
    }

    #[test]
    fn test_element_not_an_object() {
        let err = validate(&json!([1]), Schema::Sectioned).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject { index: 0 });
    }

    #[test]
    fn test_invalid_month_rejects_whole_batch() {
        let candidate = json!([
            {"name": "A", "value": "1", "period": "2026-01"},
            {"name": "B", "value": "2", "period": "2026-13"},
            {"name": "C", "value": "3", "period": "2026-03"},
        ]);
        let err = validate(&candidate, Schema::Sectioned).unwrap_err();
        match err {
            ValidationError::Field { index, field, .. } => {
                assert_eq!(index, 1);
                assert_eq!(field, "period");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_value_rejected() {
        let candidate = json!([{"name": "A", "value": "  ", "period": "2026-01"}]);
        let err = validate(&candidate, Schema::Flat).unwrap_err();
        assert!(err.to_string().contains("value"));
    }

    #[test]
    fn test_numeric_value_rejected() {
        let candidate = json!([{"name": "A", "value": 5, "period": "2026-01"}]);
        let err = validate(&candidate, Schema::Flat).unwrap_err();
        assert!(err.to_string().contains("must be text"));
    }

    #[test]
    fn test_missing_name_rejected() {
        let candidate = json!([{"value": "5", "period": "2026-01"}]);
        let err = validate(&candidate, Schema::Flat).unwrap_err();
        assert!(err.to_string().contains("'name' is missing"));
    }

    #[test]
    fn test_bad_period_grammar_rejected() {
        let candidate = json!([{"name": "A", "value": "5", "period": "2026-1"}]);
        assert!(validate(&candidate, Schema::Flat).is_err());
    }

    #[test]
    fn test_sectioned_rejects_empty_section() {
        let candidate = json!([{"name": "A", "value": "5", "period": "2026-01", "section": ""}]);
        let err = validate(&candidate, Schema::Sectioned).unwrap_err();
        assert!(err.to_string().contains("section"));
    }

    #[test]
    fn test_blank_section_never_becomes_a_tag() {
        let candidate = json!([{"name": "A", "value": "5", "period": "2026-01", "section": "   "}]);
        let err = validate(&candidate, Schema::Sectioned).unwrap_err();
        assert!(err.to_string().contains("section"));

        let candidate = json!([
            {"name": "A", "value": "5", "period": "2026-01", "section": ""},
            {"name": "B", "value": "6", "period": "2026-01", "section": " \t "},
        ]);
        let records = validate(&candidate, Schema::Flat).unwrap();
        assert!(records.iter().all(|r| r.section.is_none()));
    }

    #[test]
    fn test_sectioned_accepts_missing_section() {
        let candidate = json!([{"name": "A", "value": "5", "period": "2026-01"}]);
        let records = validate(&candidate, Schema::Sectioned).unwrap();
        assert!(records[0].section.is_none());
    }

    #[test]
    fn test_flat_ignores_section_shape() {
        let candidate = json!([{"name": "A", "value": "5", "period": "2026-01", "section": 7}]);
        let records = validate(&candidate, Schema::Flat).unwrap();
        assert!(records[0].section.is_none());
    }

    #[test]
    fn test_values_kept_verbatim() {
        let candidate = json!([{"name": "A", "value": " 007 ", "period": "2026-01"}]);
        let records = validate(&candidate, Schema::Flat).unwrap();
        assert_eq!(records[0].value, " 007 ");
    }

    #[test]
    fn test_non_text_template_rejected() {
        let candidate = json!([{"name": "A", "value": "1", "period": "2026-01", "template": true}]);
        let err = validate(&candidate, Schema::Flat).unwrap_err();
        assert!(err.to_string().contains("template"));
    }
}
