//! Terminal rendering of a form and collection of its input
//!
//! This is where raw values get their shape: the field type from the schema
//! decides whether an answer becomes a scalar, a multi-select sequence or a
//! labeled option.

use std::fmt::Write;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::CollectError;
use crate::models::{FieldGroup, FormDefinition};
use crate::normalize::{RawFieldValue, RawFieldValues};

/// Field types with a non-scalar value shape
pub mod field_types {
    /// Several choices, submitted as a sequence
    pub const MULTIPLE_CHECKBOXES: &str = "multiple_checkboxes";
    /// One choice, submitted by label
    pub const DROPDOWN: &str = "dropdown";
    /// One choice, submitted by value
    pub const RADIO: &str = "radio";
    /// Boolean, `"true"` or empty
    pub const SINGLE_CHECKBOX: &str = "single_checkbox";
}

/// Typed view of one field inside a field group
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldDescriptor {
    /// Submission name
    pub name: String,
    /// Display label, may be empty
    pub label: String,
    /// Control type, see [`field_types`]
    pub field_type: String,
    /// Must be answered
    pub required: bool,
    /// Not shown, still submitted
    pub hidden: bool,
    /// Choices for option-based controls
    pub options: Vec<FieldOption>,
    /// Answer used when none is given; only strings are honored
    pub default_value: Option<Value>,
}

/// One choice of an option-based field
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldOption {
    /// Shown to the user
    pub label: String,
    /// Stored value
    pub value: String,
}

impl FieldDescriptor {
    fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// Exact value match first, then case-insensitive value or label
    fn find_option(&self, choice: &str) -> Option<&FieldOption> {
        self.options.iter().find(|o| o.value == choice).or_else(|| {
            self.options
                .iter()
                .find(|o| o.value.eq_ignore_ascii_case(choice) || o.label.eq_ignore_ascii_case(choice))
        })
    }

    fn option(&self, choice: &str) -> Result<&FieldOption, CollectError> {
        self.find_option(choice).ok_or_else(|| CollectError::UnknownOption {
            field: self.name.clone(),
            choice: choice.to_string(),
        })
    }

    /// Shape `input` the way this field's control would
    fn raw_value(&self, input: &str) -> Result<RawFieldValue, CollectError> {
        let input = input.trim();
        match self.field_type.as_str() {
            field_types::MULTIPLE_CHECKBOXES => {
                let values = input
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(|c| self.option(c).map(|o| o.value.clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RawFieldValue::Sequence(values))
            }
            field_types::DROPDOWN if input.is_empty() => Ok(RawFieldValue::scalar("")),
            field_types::DROPDOWN => {
                let option = self.option(input)?;
                Ok(RawFieldValue::option(option.label.clone(), option.value.clone()))
            }
            field_types::RADIO if !input.is_empty() => {
                Ok(RawFieldValue::scalar(self.option(input)?.value.clone()))
            }
            field_types::SINGLE_CHECKBOX => {
                let checked = matches!(input.to_ascii_lowercase().as_str(), "true" | "yes" | "on" | "1");
                Ok(RawFieldValue::scalar(if checked { "true" } else { "" }))
            }
            _ => Ok(RawFieldValue::scalar(input)),
        }
    }
}

fn group_fields(group: &FieldGroup) -> &[Value] {
    group
        .get("fields")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// All field descriptors of a definition, in schema order.
/// Entries that are not recognizable fields are skipped.
pub fn descriptors(definition: &FormDefinition) -> Vec<FieldDescriptor> {
    definition
        .field_groups
        .iter()
        .flat_map(group_fields)
        .filter_map(|field| match FieldDescriptor::deserialize(field) {
            Ok(descriptor) if !descriptor.name.is_empty() => Some(descriptor),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "skipping unrecognized field");
                None
            }
        })
        .collect()
}

/// Human-readable listing of the form
pub fn render_form(definition: &FormDefinition) -> String {
    let fields = descriptors(definition);
    let mut out = String::new();

    if fields.is_empty() {
        out.push_str("(this form has no fields)\n");
    }

    for field in fields.iter().filter(|f| !f.hidden) {
        let marker = if field.required { "*" } else { " " };
        let _ = writeln!(
            out,
            "{} {} [{}] ({})",
            marker,
            field.display_label(),
            field.name,
            field.field_type
        );
        for option in &field.options {
            let _ = writeln!(out, "      - {} = {}", option.value, option.label);
        }
    }

    let button = if definition.submit_button_text.is_empty() {
        "Submit"
    } else {
        &definition.submit_button_text
    };
    let _ = writeln!(out, "[ {} ]", button);
    out
}

/// Split `name=value`
pub fn parse_assignment(input: &str) -> Result<(String, String), CollectError> {
    match input.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(CollectError::MalformedInput(input.to_string())),
    }
}

/// Build raw values for every field of the form from `name=value` answers.
///
/// Unanswered fields take their schema default, or empty.
pub fn collect_values(
    definition: &FormDefinition,
    answers: &[(String, String)],
) -> Result<RawFieldValues, CollectError> {
    let fields = descriptors(definition);

    if let Some((unknown, _)) = answers
        .iter()
        .find(|(name, _)| !fields.iter().any(|f| &f.name == name))
    {
        return Err(CollectError::UnknownField(unknown.clone()));
    }

    let mut values = RawFieldValues::new();
    for field in &fields {
        let answer = answers
            .iter()
            .rev()
            .find(|(name, _)| *name == field.name)
            .map(|(_, value)| value.as_str())
            .or(field.default_value.as_ref().and_then(Value::as_str))
            .unwrap_or_default();

        let value = field.raw_value(answer)?;
        if field.required && value.submission_text().is_empty() {
            return Err(CollectError::MissingRequired(field.name.clone()));
        }
        values.insert(field.name.clone(), value);
    }

    Ok(values)
}
