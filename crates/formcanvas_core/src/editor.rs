//! Form editing reducer.
//!
//! # Responsibility
//! - Express every in-memory form mutation as a `FormEvent`.
//! - Apply events one at a time so UI callbacks reduce to sequential calls.
//!
//! # Invariants
//! - An event that would leave the form invalid is rejected and the form is
//!   left exactly as it was.
//! - Fields are only reachable through their owning `Form`.

use crate::layout::geometry::{Point, Size, DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH};
use crate::model::form::{
    FieldId, FieldOption, FieldPosition, FieldType, FieldValue, Form, FormField,
    FormValidationError,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// One mutation of a form under edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    SetTitle(String),
    SetDescription(Option<String>),
    /// A palette control was dropped on the canvas at `at`.
    DropField {
        field_id: FieldId,
        kind: FieldType,
        at: Point,
    },
    SetLabel {
        field_id: FieldId,
        label: String,
    },
    SetPlaceholder {
        field_id: FieldId,
        placeholder: Option<String>,
    },
    SetRequired {
        field_id: FieldId,
        required: bool,
    },
    SetOptions {
        field_id: FieldId,
        options: Vec<FieldOption>,
    },
    /// Newline-separated option entries; each line is both value and label.
    SetOptionsFromText {
        field_id: FieldId,
        text: String,
    },
    SetNumberRange {
        field_id: FieldId,
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },
    SetDefaultValue {
        field_id: FieldId,
        value: Option<FieldValue>,
    },
    /// Sets one style key; `None` or JSON `null` clears it.
    SetStyle {
        field_id: FieldId,
        key: String,
        value: Option<serde_json::Value>,
    },
    /// Moves a field and optionally resizes it; stacking order is kept.
    Reshape {
        field_id: FieldId,
        origin: Point,
        size: Option<Size>,
    },
    RemoveField {
        field_id: FieldId,
    },
    BringToFront {
        field_id: FieldId,
    },
}

impl FormEvent {
    /// Drop event with a freshly generated field id.
    pub fn drop_field(kind: FieldType, at: Point) -> Self {
        Self::DropField {
            field_id: Uuid::new_v4().to_string(),
            kind,
            at,
        }
    }
}

/// Reasons an edit event was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    FieldNotFound(FieldId),
    DuplicateField(FieldId),
    /// The attribute has no meaning for this field type.
    NotApplicable {
        field_id: FieldId,
        kind: FieldType,
        attribute: &'static str,
    },
    Invalid(FormValidationError),
    /// No stacking order is left above the current top field.
    StackingOrderExhausted,
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldNotFound(id) => write!(f, "field not found: {id}"),
            Self::DuplicateField(id) => write!(f, "field already exists: {id}"),
            Self::NotApplicable {
                field_id,
                kind,
                attribute,
            } => write!(
                f,
                "`{attribute}` does not apply to {kind} field `{field_id}`"
            ),
            Self::Invalid(err) => write!(f, "{err}"),
            Self::StackingOrderExhausted => {
                write!(f, "no stacking order left above zIndex {}", i32::MAX)
            }
        }
    }
}

impl Error for EditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FormValidationError> for EditError {
    fn from(value: FormValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl Form {
    /// Applies one edit event.
    ///
    /// Field edits are staged on a copy of the field and committed only once
    /// the copy validates. `Reshape` touches geometry only and skips that
    /// check.
    pub fn apply(&mut self, event: FormEvent) -> Result<(), EditError> {
        match event {
            FormEvent::SetTitle(title) => {
                if title.trim().is_empty() {
                    return Err(FormValidationError::EmptyTitle.into());
                }
                self.title = title;
                Ok(())
            }
            FormEvent::SetDescription(description) => {
                self.description = description.filter(|text| !text.trim().is_empty());
                Ok(())
            }
            FormEvent::DropField { field_id, kind, at } => self.drop_field(field_id, kind, at),
            FormEvent::SetLabel { field_id, label } => self.edit_field(&field_id, |field| {
                field.label = label;
                Ok(())
            }),
            FormEvent::SetPlaceholder {
                field_id,
                placeholder,
            } => self.edit_field(&field_id, |field| {
                field.placeholder = placeholder.filter(|text| !text.is_empty());
                Ok(())
            }),
            FormEvent::SetRequired { field_id, required } => {
                self.edit_field(&field_id, |field| {
                    field.required = required;
                    Ok(())
                })
            }
            FormEvent::SetOptions { field_id, options } => self.edit_field(&field_id, |field| {
                require_kind(field, FieldType::is_choice, "options")?;
                field.options = options;
                Ok(())
            }),
            FormEvent::SetOptionsFromText { field_id, text } => {
                self.edit_field(&field_id, |field| {
                    require_kind(field, FieldType::is_choice, "options")?;
                    field.options = parse_option_lines(&text);
                    Ok(())
                })
            }
            FormEvent::SetNumberRange {
                field_id,
                min,
                max,
                step,
            } => self.edit_field(&field_id, |field| {
                require_kind(field, FieldType::is_numeric, "min/max/step")?;
                field.min = min;
                field.max = max;
                field.step = step;
                Ok(())
            }),
            FormEvent::SetDefaultValue { field_id, value } => {
                self.edit_field(&field_id, |field| {
                    field.value = value;
                    Ok(())
                })
            }
            FormEvent::SetStyle {
                field_id,
                key,
                value,
            } => self.edit_field(&field_id, |field| {
                let value = value.filter(|value| !value.is_null());
                if key == "width" {
                    field.style.width = value.map(style_text);
                } else if key == "height" {
                    field.style.height = value.map(style_text);
                } else if let Some(value) = value {
                    field.style.extra.insert(key, value);
                } else {
                    field.style.extra.shift_remove(&key);
                }
                Ok(())
            }),
            FormEvent::Reshape {
                field_id,
                origin,
                size,
            } => {
                // Geometry only; other attributes are not re-validated.
                let field = self
                    .model
                    .get_mut(&field_id)
                    .ok_or(EditError::FieldNotFound(field_id))?;
                field.position.x = origin.x;
                field.position.y = origin.y;
                if let Some(size) = size {
                    field.style.set_size_px(size.width, size.height);
                }
                Ok(())
            }
            FormEvent::RemoveField { field_id } => match self.model.shift_remove(&field_id) {
                Some(_) => Ok(()),
                None => Err(EditError::FieldNotFound(field_id)),
            },
            FormEvent::BringToFront { field_id } => {
                let top = self.max_z_index();
                self.edit_field(&field_id, |field| {
                    let others_on_top = field.position.z_index < top;
                    if others_on_top {
                        field.position.z_index = next_z_index(top)?;
                    }
                    Ok(())
                })
            }
        }
    }

    fn drop_field(&mut self, field_id: FieldId, kind: FieldType, at: Point) -> Result<(), EditError> {
        if self.model.contains_key(&field_id) {
            return Err(EditError::DuplicateField(field_id));
        }

        let mut field = FormField::new(field_id.clone(), kind, kind.default_label());
        field.position = FieldPosition {
            x: at.x.max(0.0),
            y: at.y.max(0.0),
            z_index: next_z_index(self.max_z_index())?,
        };
        field
            .style
            .set_size_px(DEFAULT_FIELD_WIDTH, DEFAULT_FIELD_HEIGHT);
        if kind.is_choice() {
            field.options = vec![FieldOption::new("option1", "Option 1")];
        }
        field.validate()?;

        self.model.insert(field_id, field);
        Ok(())
    }

    fn edit_field(
        &mut self,
        field_id: &str,
        edit: impl FnOnce(&mut FormField) -> Result<(), EditError>,
    ) -> Result<(), EditError> {
        let current = self
            .model
            .get(field_id)
            .ok_or_else(|| EditError::FieldNotFound(field_id.to_string()))?;

        let mut staged = current.clone();
        edit(&mut staged)?;
        staged.validate()?;

        if let Some(slot) = self.model.get_mut(field_id) {
            *slot = staged;
        }
        Ok(())
    }
}

fn next_z_index(top: i32) -> Result<i32, EditError> {
    top.checked_add(1).ok_or(EditError::StackingOrderExhausted)
}

fn require_kind(
    field: &FormField,
    applies: fn(FieldType) -> bool,
    attribute: &'static str,
) -> Result<(), EditError> {
    if applies(field.kind) {
        return Ok(());
    }
    Err(EditError::NotApplicable {
        field_id: field.id.clone(),
        kind: field.kind,
        attribute,
    })
}

/// Splits editor text into options, skipping blank lines.
pub fn parse_option_lines(text: &str) -> Vec<FieldOption> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| FieldOption::new(line, line))
        .collect()
}

fn style_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Number(number) => format!("{number}px"),
        other => other.to_string(),
    }
}
