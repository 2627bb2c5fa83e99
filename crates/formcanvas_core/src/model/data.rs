//! Fill-in values for a rendered form.
//!
//! `FormData` is never persisted with the form; it is seeded from field
//! defaults when a form is first rendered and checked against the form's
//! constraints on submit.

use crate::model::form::{FieldType, FieldValue, Form, FormField};
use indexmap::IndexMap;

/// Submitted or initial values keyed by field id.
pub type FormData = IndexMap<String, FieldValue>;

/// Human-readable problems keyed by field id.
pub type FormErrors = IndexMap<String, String>;

impl Form {
    /// Builds the values a freshly rendered form starts with.
    ///
    /// Declared `value` defaults win; otherwise checkboxes start unchecked and
    /// every other control starts empty.
    pub fn initial_data(&self) -> FormData {
        self.fields()
            .map(|field| {
                let value = field.value.clone().unwrap_or_else(|| match field.kind {
                    FieldType::Checkbox => FieldValue::Bool(false),
                    _ => FieldValue::Text(String::new()),
                });
                (field.id.clone(), value)
            })
            .collect()
    }

    /// Checks submitted values against field constraints.
    ///
    /// Returns an empty map when every value is acceptable. Keys in `data`
    /// that name no field are reported too.
    pub fn validate_data(&self, data: &FormData) -> FormErrors {
        let mut errors = FormErrors::new();

        for field in self.fields() {
            let value = data.get(&field.id);
            if is_blank(field, value) {
                if field.required {
                    errors.insert(field.id.clone(), format!("{} is required", field.label));
                }
                continue;
            }
            if let Some(value) = value {
                if let Some(message) = check_value(field, value) {
                    errors.insert(field.id.clone(), message);
                }
            }
        }

        for key in data.keys() {
            if !self.model.contains_key(key) {
                errors.insert(key.clone(), format!("unknown field `{key}`"));
            }
        }

        errors
    }
}

fn is_blank(field: &FormField, value: Option<&FieldValue>) -> bool {
    match value {
        None => true,
        Some(FieldValue::Text(text)) => text.trim().is_empty(),
        Some(FieldValue::List(items)) => items.is_empty(),
        Some(FieldValue::Bool(checked)) => field.kind == FieldType::Checkbox && !checked,
        Some(FieldValue::Number(_)) => false,
    }
}

fn check_value(field: &FormField, value: &FieldValue) -> Option<String> {
    match field.kind {
        FieldType::Select | FieldType::Radio => {
            let chosen: Vec<String> = match value {
                FieldValue::Text(text) => vec![text.clone()],
                FieldValue::Number(number) => vec![number.to_string()],
                FieldValue::List(items) => items.clone(),
                FieldValue::Bool(flag) => vec![flag.to_string()],
            };
            chosen
                .iter()
                .find(|candidate| !field.options.iter().any(|option| &option.value == *candidate))
                .map(|invalid| format!("`{invalid}` is not an option of {}", field.label))
        }
        FieldType::Number => {
            let number = match value {
                FieldValue::Number(number) => Some(*number),
                FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
                _ => None,
            };
            let Some(number) = number.filter(|number| number.is_finite()) else {
                return Some(format!("{} must be a number", field.label));
            };
            if let Some(min) = field.min.filter(|min| number < *min) {
                return Some(format!("{} must be at least {min}", field.label));
            }
            if let Some(max) = field.max.filter(|max| number > *max) {
                return Some(format!("{} must be at most {max}", field.label));
            }
            None
        }
        FieldType::Email => match value {
            FieldValue::Text(text) if is_plausible_email(text.trim()) => None,
            _ => Some(format!("{} must be an email address", field.label)),
        },
        FieldType::Checkbox => match value {
            FieldValue::Bool(_) => None,
            _ => Some(format!("{} must be checked or unchecked", field.label)),
        },
        FieldType::Text | FieldType::Password | FieldType::Textarea => match value {
            FieldValue::Text(_) | FieldValue::Number(_) => None,
            _ => Some(format!("{} must be text", field.label)),
        },
    }
}

fn is_plausible_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace)
        }
        _ => false,
    }
}
