//! Form and field document types.
//!
//! # Responsibility
//! - Describe the exact JSON shape persisted per form.
//! - Validate and normalize documents before they reach a store.
//!
//! # Invariants
//! - `Form::id` matches `^[A-Za-z0-9_-]{1,128}$` because it names a document
//!   on disk.
//! - `model` keeps insertion order, which is the display order.
//! - `min`/`max`/`step` are only meaningful for `number` fields and `options`
//!   only for `select`/`radio`; `normalize()` strips them elsewhere.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static FORM_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("valid form id regex"));
static PX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*px\s*$").expect("valid px regex"));

/// Identifier of a persisted form document.
pub type FormId = String;

/// Identifier of a field, unique within its form.
pub type FieldId = String;

/// Ordered field map keyed by field id.
pub type FormModel = IndexMap<FieldId, FormField>;

/// Input control kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Email,
    Password,
    Select,
    Radio,
    Checkbox,
    Textarea,
}

impl FieldType {
    /// Wire name, as used in the `type` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Email => "email",
            Self::Password => "password",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Textarea => "textarea",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "email" => Some(Self::Email),
            "password" => Some(Self::Password),
            "select" => Some(Self::Select),
            "radio" => Some(Self::Radio),
            "checkbox" => Some(Self::Checkbox),
            "textarea" => Some(Self::Textarea),
            _ => None,
        }
    }

    /// Whether the field requires a non-empty option list.
    pub fn is_choice(self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }

    /// Whether `min`/`max`/`step` apply.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number)
    }

    /// Label given to a freshly dropped control.
    pub fn default_label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Number => "Number",
            Self::Email => "Email",
            Self::Password => "Password",
            Self::Select => "Select",
            Self::Radio => "Radio",
            Self::Checkbox => "Checkbox",
            Self::Textarea => "Textarea",
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable entry of a `select` or `radio` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Canvas placement of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPosition {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Stacking order; absent values load as `1`.
    #[serde(default = "default_z_index")]
    pub z_index: i32,
}

impl FieldPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z_index: default_z_index(),
        }
    }
}

impl Default for FieldPosition {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

fn default_z_index() -> i32 {
    1
}

/// Sparse visual overrides for one field.
///
/// `width` and `height` are CSS pixel strings (`"150px"`) driven by the
/// layout controller. Every other key is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl FieldStyle {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.extra.is_empty()
    }

    /// Width in pixels when it is expressed as a `px` value.
    pub fn width_px(&self) -> Option<f64> {
        self.width.as_deref().and_then(parse_px)
    }

    /// Height in pixels when it is expressed as a `px` value.
    pub fn height_px(&self) -> Option<f64> {
        self.height.as_deref().and_then(parse_px)
    }

    pub fn set_size_px(&mut self, width: f64, height: f64) {
        self.width = Some(format_px(width));
        self.height = Some(format_px(height));
    }
}

/// Formats a pixel length the way styles store it (`150px`, `150.5px`).
pub fn format_px(value: f64) -> String {
    format!("{value}px")
}

/// Parses a `<number>px` style value.
pub fn parse_px(value: &str) -> Option<f64> {
    let captures = PX_RE.captures(value)?;
    captures.get(1)?.as_str().parse().ok()
}

/// Default or submitted value of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

/// One input control on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: FieldId,
    /// Serialized as `type` to match the document schema.
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Number fields only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Number fields only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Number fields only; must be positive when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Select/radio fields only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub position: FieldPosition,
    #[serde(default, skip_serializing_if = "FieldStyle::is_empty")]
    pub style: FieldStyle,
    /// Default value used to seed fill-in data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
}

impl FormField {
    /// Creates a field with no constraints at the canvas origin.
    pub fn new(id: impl Into<FieldId>, kind: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            placeholder: None,
            required: false,
            min: None,
            max: None,
            step: None,
            options: Vec::new(),
            position: FieldPosition::default(),
            style: FieldStyle::default(),
            value: None,
        }
    }

    /// Builder-style helper for choice fields.
    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_position(mut self, position: FieldPosition) -> Self {
        self.position = position;
        self
    }

    /// Validates the field on its own, without its map key.
    pub fn validate(&self) -> Result<(), FormValidationError> {
        if self.id.trim().is_empty() {
            return Err(FormValidationError::EmptyFieldId);
        }
        if self.label.trim().is_empty() {
            return Err(FormValidationError::EmptyLabel {
                field_id: self.id.clone(),
            });
        }

        if self.kind.is_choice() {
            if self.options.is_empty() {
                return Err(FormValidationError::MissingOptions {
                    field_id: self.id.clone(),
                    kind: self.kind,
                });
            }
            let mut seen = HashSet::new();
            for option in &self.options {
                if option.value.trim().is_empty() {
                    return Err(FormValidationError::EmptyOptionValue {
                        field_id: self.id.clone(),
                    });
                }
                if !seen.insert(option.value.as_str()) {
                    return Err(FormValidationError::DuplicateOption {
                        field_id: self.id.clone(),
                        value: option.value.clone(),
                    });
                }
            }
        }

        if self.kind.is_numeric() {
            if let (Some(min), Some(max)) = (self.min, self.max) {
                if min > max {
                    return Err(FormValidationError::InvalidRange {
                        field_id: self.id.clone(),
                        min,
                        max,
                    });
                }
            }
            if let Some(step) = self.step {
                if !(step > 0.0) {
                    return Err(FormValidationError::InvalidStep {
                        field_id: self.id.clone(),
                        step,
                    });
                }
            }
        }

        Ok(())
    }

    /// Drops attributes that have no meaning for this field's type.
    pub fn normalize(&mut self) {
        if !self.kind.is_choice() {
            self.options.clear();
        }
        if !self.kind.is_numeric() {
            self.min = None;
            self.max = None;
            self.step = None;
        }
    }
}

/// Persisted form document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: FormId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub model: FormModel,
    /// Unix epoch milliseconds, assigned by the store on first write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Unix epoch milliseconds, refreshed by the store on every write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Form {
    /// Creates an empty, unsaved form.
    pub fn new(id: impl Into<FormId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            model: FormModel::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Appends a field keyed by its own id, replacing any field with that id.
    pub fn with_field(mut self, field: FormField) -> Self {
        self.model.insert(field.id.clone(), field);
        self
    }

    pub fn field(&self, field_id: &str) -> Option<&FormField> {
        self.model.get(field_id)
    }

    /// Fields in display order.
    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.model.values()
    }

    /// Highest stacking order currently used, `0` for an empty form.
    pub fn max_z_index(&self) -> i32 {
        self.fields()
            .map(|field| field.position.z_index)
            .max()
            .unwrap_or(0)
    }

    /// Validates document-level invariants and every field.
    pub fn validate(&self) -> Result<(), FormValidationError> {
        validate_form_id(&self.id)?;
        if self.title.trim().is_empty() {
            return Err(FormValidationError::EmptyTitle);
        }
        for (key, field) in &self.model {
            if key != &field.id {
                return Err(FormValidationError::FieldKeyMismatch {
                    key: key.clone(),
                    field_id: field.id.clone(),
                });
            }
            field.validate()?;
        }
        Ok(())
    }

    /// Normalizes every field in place.
    pub fn normalize(&mut self) {
        for field in self.model.values_mut() {
            field.normalize();
        }
    }

    /// Parses a JSON request body into a form.
    ///
    /// Non-object bodies and schema mismatches are reported as
    /// `FormValidationError::Malformed`. The result is not validated.
    pub fn from_json_str(body: &str) -> Result<Self, FormValidationError> {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|err| FormValidationError::Malformed(err.to_string()))?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, FormValidationError> {
        if !value.is_object() {
            return Err(FormValidationError::Malformed(
                "form document must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|err| FormValidationError::Malformed(err.to_string()))
    }
}

/// Checks that `id` can be used to address a stored form.
pub fn validate_form_id(id: &str) -> Result<(), FormValidationError> {
    if id.trim().is_empty() {
        return Err(FormValidationError::EmptyFormId);
    }
    if !FORM_ID_RE.is_match(id) {
        return Err(FormValidationError::InvalidFormId(id.to_string()));
    }
    Ok(())
}

/// Structural problems in a form document or request.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValidationError {
    EmptyFormId,
    InvalidFormId(String),
    EmptyTitle,
    EmptyFieldId,
    FieldKeyMismatch { key: String, field_id: String },
    EmptyLabel { field_id: String },
    MissingOptions { field_id: String, kind: FieldType },
    EmptyOptionValue { field_id: String },
    DuplicateOption { field_id: String, value: String },
    InvalidRange { field_id: String, min: f64, max: f64 },
    InvalidStep { field_id: String, step: f64 },
    /// Path id and body id disagree on update.
    IdMismatch { path_id: String, body_id: String },
    /// Body is not a form document at all.
    Malformed(String),
}

impl Display for FormValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFormId => write!(f, "form id must not be empty"),
            Self::InvalidFormId(id) => write!(
                f,
                "form id `{id}` must contain only letters, digits, `-` or `_` (max 128)"
            ),
            Self::EmptyTitle => write!(f, "form title must not be empty"),
            Self::EmptyFieldId => write!(f, "field id must not be empty"),
            Self::FieldKeyMismatch { key, field_id } => {
                write!(f, "model key `{key}` does not match field id `{field_id}`")
            }
            Self::EmptyLabel { field_id } => {
                write!(f, "field `{field_id}` must have a label")
            }
            Self::MissingOptions { field_id, kind } => {
                write!(f, "{kind} field `{field_id}` requires at least one option")
            }
            Self::EmptyOptionValue { field_id } => {
                write!(f, "field `{field_id}` has an option with an empty value")
            }
            Self::DuplicateOption { field_id, value } => {
                write!(f, "field `{field_id}` repeats option value `{value}`")
            }
            Self::InvalidRange { field_id, min, max } => {
                write!(f, "field `{field_id}` has min ({min}) greater than max ({max})")
            }
            Self::InvalidStep { field_id, step } => {
                write!(f, "field `{field_id}` step ({step}) must be positive")
            }
            Self::IdMismatch { path_id, body_id } => write!(
                f,
                "form id `{body_id}` in body does not match addressed id `{path_id}`"
            ),
            Self::Malformed(message) => write!(f, "malformed form document: {message}"),
        }
    }
}

impl Error for FormValidationError {}
