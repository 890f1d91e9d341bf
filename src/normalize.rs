//! Field Normalizer
//!
//! Flattens the heterogeneous values a form produces into the flat
//! `{name, value}` list the submission API accepts.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::NormalizedField;

/// Joins the entries of a multi-select value
pub const MULTI_VALUE_SEPARATOR: &str = "; ";

/// One raw value as produced by a form control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFieldValue {
    /// Text-like input; falsy input is already the empty string
    Scalar(String),
    /// Multi-select, in selection order
    Sequence(Vec<String>),
    /// Choice from a labeled option list
    LabeledOption {
        /// Shown to the user and submitted
        label: Option<String>,
        /// Internal option value
        value: Option<String>,
    },
}

impl RawFieldValue {
    /// Text-like value
    pub fn scalar(value: impl Into<String>) -> Self {
        RawFieldValue::Scalar(value.into())
    }

    /// Multi-select value
    pub fn sequence<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawFieldValue::Sequence(values.into_iter().map(Into::into).collect())
    }

    /// Chosen option with both label and value
    pub fn option(label: impl Into<String>, value: impl Into<String>) -> Self {
        RawFieldValue::LabeledOption {
            label: Some(label.into()),
            value: Some(value.into()),
        }
    }

    /// The text submitted for this value
    pub fn submission_text(&self) -> String {
        match self {
            RawFieldValue::Sequence(values) => values.join(MULTI_VALUE_SEPARATOR),
            RawFieldValue::LabeledOption { label, .. } => label.clone().unwrap_or_default(),
            RawFieldValue::Scalar(value) => value.clone(),
        }
    }
}

impl From<Value> for RawFieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => RawFieldValue::Sequence(items.iter().map(element_text).collect()),
            Value::Object(map) => RawFieldValue::LabeledOption {
                label: map.get("label").map(truthy_text),
                value: map.get("value").map(element_text),
            },
            Value::Null => RawFieldValue::LabeledOption {
                label: None,
                value: None,
            },
            scalar => RawFieldValue::Scalar(truthy_text(&scalar)),
        }
    }
}

impl<'de> Deserialize<'de> for RawFieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(RawFieldValue::from)
    }
}

/// Text of a value that substitutes "" for falsy input
fn truthy_text(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        other => element_text(other),
    }
}

/// Text of a multi-select element; only null collapses to ""
fn element_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Field name to raw value, in insertion order, names unique.
///
/// Inserting an existing name replaces its value and keeps its position.
pub type RawFieldValues = IndexMap<String, RawFieldValue>;

/// One normalized field per raw entry, in the same order
pub fn normalize(raw: &RawFieldValues) -> Vec<NormalizedField> {
    raw.iter()
        .map(|(name, value)| NormalizedField::new(name, value.submission_text()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, value: &str) -> NormalizedField {
        NormalizedField::new(name, value)
    }

    fn raw<const N: usize>(entries: [(&str, RawFieldValue); N]) -> RawFieldValues {
        entries.into_iter().map(|(name, value)| (name.to_string(), value)).collect()
    }

    #[test]
    fn test_sequence_is_joined() {
        let raw = raw([("a", RawFieldValue::sequence(["x", "y", "z"]))]);
        assert_eq!(normalize(&raw), vec![field("a", "x; y; z")]);
    }

    #[test]
    fn test_labeled_option_uses_label() {
        let raw = raw([("a", RawFieldValue::option("Yes", "1"))]);
        assert_eq!(normalize(&raw), vec![field("a", "Yes")]);
    }

    #[test]
    fn test_labeled_option_without_label_is_empty() {
        let raw = raw([(
            "a",
            RawFieldValue::LabeledOption {
                label: None,
                value: Some("1".into()),
            },
        )]);
        assert_eq!(normalize(&raw), vec![field("a", "")]);
    }

    #[test]
    fn test_scalars_pass_through() {
        let raw = raw([("a", RawFieldValue::scalar("hello")), ("b", RawFieldValue::scalar(""))]);
        assert_eq!(normalize(&raw), vec![field("a", "hello"), field("b", "")]);
    }

    #[test]
    fn test_one_entry_per_key_in_order() {
        let raw = raw([
            ("zeta", RawFieldValue::scalar("1")),
            ("alpha", RawFieldValue::sequence(Vec::<String>::new())),
            ("mid", RawFieldValue::option("M", "m")),
        ]);

        let names: Vec<_> = normalize(&raw).into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut raw = RawFieldValues::new();
        raw.insert("first".into(), RawFieldValue::scalar("1"));
        raw.insert("second".into(), RawFieldValue::scalar("2"));
        let old = raw.insert("first".into(), RawFieldValue::scalar("3"));

        assert_eq!(old, Some(RawFieldValue::scalar("1")));
        assert_eq!(raw.len(), 2);
        assert_eq!(normalize(&raw), vec![field("first", "3"), field("second", "2")]);
    }

    #[test]
    fn test_deserialize_preserves_document_order() {
        let raw: RawFieldValues = serde_json::from_str(r#"{"z": "1", "a": "2", "m": "3"}"#).unwrap();
        let names: Vec<_> = raw.iter().map(|(name, _)| name.to_string()).collect();
        assert_eq!(names, ["z", "a", "m"]);
    }

    #[test]
    fn test_deserialize_shapes() {
        let raw: RawFieldValues = serde_json::from_value(json!({
            "interests": ["a", null, 2, false],
            "country": { "label": "Germany", "value": "DE" },
            "unlabeled": { "value": "1" },
            "cleared": null,
            "email": "x@example.com",
            "opt_in": false,
            "count": 0,
            "agree": true,
            "size": 12
        }))
        .unwrap();

        assert_eq!(
            normalize(&raw),
            vec![
                field("interests", "a; ; 2; false"),
                field("country", "Germany"),
                field("unlabeled", ""),
                field("cleared", ""),
                field("email", "x@example.com"),
                field("opt_in", ""),
                field("count", ""),
                field("agree", "true"),
                field("size", "12"),
            ]
        );
    }

    #[test]
    fn test_deserialize_duplicate_name_keeps_first_position() {
        let raw: RawFieldValues = serde_json::from_str(r#"{"a": "1", "b": "2", "a": "3"}"#).unwrap();
        assert_eq!(normalize(&raw), vec![field("a", "3"), field("b", "2")]);
    }

    #[test]
    fn test_deserialize_rejects_non_map() {
        assert!(serde_json::from_value::<RawFieldValues>(json!(["a"])).is_err());
    }
}
