//! Form repository contract and error taxonomy.
//!
//! # Invariants
//! - `create` never overwrites; an existing id is `Conflict`.
//! - `update` never creates; a missing id is `NotFound`.
//! - `update` rejects a body whose id differs from the addressed id before
//!   looking at storage.

use crate::db::DbError;
use crate::model::form::{validate_form_id, Form, FormValidationError};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a store operation, closed over the four outcomes callers
/// handle.
#[derive(Debug)]
pub enum StoreError {
    /// No document with this id.
    NotFound(String),
    /// `create` on an id that is already stored.
    Conflict(String),
    /// The request itself is invalid.
    BadRequest(FormValidationError),
    /// Underlying storage failed; never retried by the store.
    Storage(StorageError),
}

impl StoreError {
    /// HTTP-equivalent status for the error class.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::BadRequest(_) => 400,
            Self::Storage(_) => 500,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "form not found: {id}"),
            Self::Conflict(id) => write!(f, "form already exists: {id}"),
            Self::BadRequest(err) => write!(f, "bad request: {err}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) | Self::Conflict(_) => None,
            Self::BadRequest(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<FormValidationError> for StoreError {
    fn from(value: FormValidationError) -> Self {
        Self::BadRequest(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Storage(StorageError::Db(value))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Db(DbError::Sqlite(value)))
    }
}

/// Opaque storage failure carrying its cause.
#[derive(Debug)]
pub enum StorageError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Db(DbError),
    Encode(serde_json::Error),
    /// A stored document could not be decoded or failed validation.
    Corrupt { id: String, reason: String },
    /// The SQLite connection has not been migrated to the current schema.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode form document: {err}"),
            Self::Corrupt { id, reason } => {
                write!(f, "stored form `{id}` is invalid: {reason}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "forms database is at schema version {actual_version}, expected {expected_version}; open it with `open_db`"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "forms database is missing table `{table}`")
            }
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Corrupt { .. }
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

/// Storage contract for form documents keyed by id.
///
/// Methods block on I/O. There is no version check between callers:
/// concurrent updates of one id are last-writer-wins.
pub trait FormRepository {
    /// Every stored form, ordered by id. A missing storage root is empty.
    fn list_forms(&self) -> StoreResult<Vec<Form>>;
    fn get_form(&self, id: &str) -> StoreResult<Form>;
    /// Stores a new document and returns it with timestamps assigned.
    fn create_form(&self, form: &Form) -> StoreResult<Form>;
    /// Replaces an existing document atomically and returns the stored copy.
    fn update_form(&self, id: &str, form: &Form) -> StoreResult<Form>;
    fn delete_form(&self, id: &str) -> StoreResult<()>;
}

impl<R: FormRepository + ?Sized> FormRepository for Box<R> {
    fn list_forms(&self) -> StoreResult<Vec<Form>> {
        (**self).list_forms()
    }

    fn get_form(&self, id: &str) -> StoreResult<Form> {
        (**self).get_form(id)
    }

    fn create_form(&self, form: &Form) -> StoreResult<Form> {
        (**self).create_form(form)
    }

    fn update_form(&self, id: &str, form: &Form) -> StoreResult<Form> {
        (**self).update_form(id, form)
    }

    fn delete_form(&self, id: &str) -> StoreResult<()> {
        (**self).delete_form(id)
    }
}

/// Current time in Unix epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// Checks an addressed id before any storage access.
pub(crate) fn check_id(id: &str) -> StoreResult<()> {
    validate_form_id(id).map_err(StoreError::BadRequest)
}

/// Normalized, validated copy of a create body with timestamps assigned.
pub(crate) fn prepare_create(form: &Form, now: i64) -> StoreResult<Form> {
    let mut stored = prepare_body(form)?;
    stored.created_at = Some(form.created_at.unwrap_or(now));
    stored.updated_at = Some(now);
    Ok(stored)
}

/// Normalized, validated copy of an update body. Timestamps are stamped
/// later against the stored document.
pub(crate) fn prepare_update(id: &str, form: &Form) -> StoreResult<Form> {
    check_id(id)?;
    if form.id != id {
        return Err(StoreError::BadRequest(FormValidationError::IdMismatch {
            path_id: id.to_string(),
            body_id: form.id.clone(),
        }));
    }
    prepare_body(form)
}

/// Keeps the stored creation time and moves `updatedAt` forward.
pub(crate) fn stamp_update(body: &mut Form, existing: &Form, now: i64) {
    body.created_at = existing.created_at.or(body.created_at).or(Some(now));
    body.updated_at = Some(existing.updated_at.map_or(now, |previous| previous.max(now)));
}

/// Decodes a stored document and checks it still belongs under `id`.
pub(crate) fn decode_stored(id: &str, document: &str) -> StoreResult<Form> {
    let corrupt = |reason: String| {
        StoreError::Storage(StorageError::Corrupt {
            id: id.to_string(),
            reason,
        })
    };

    let form: Form = serde_json::from_str(document).map_err(|err| corrupt(err.to_string()))?;
    if form.id != id {
        return Err(corrupt(format!("document declares id `{}`", form.id)));
    }
    form.validate().map_err(|err| corrupt(err.to_string()))?;
    Ok(form)
}

/// Logs expected caller-side outcomes. Conflicts and storage failures are
/// logged where they happen.
pub(crate) fn log_rejection(event: &str, backend: &str, id: &str, err: &StoreError) {
    match err {
        StoreError::NotFound(_) => {
            debug!("event={event} module=store status=not_found backend={backend} id={id}");
        }
        StoreError::BadRequest(reason) => debug!(
            "event={event} module=store status=bad_request backend={backend} id={id} error={reason}"
        ),
        StoreError::Conflict(_) | StoreError::Storage(_) => {}
    }
}

pub(crate) fn encode_document(form: &Form) -> StoreResult<String> {
    serde_json::to_string_pretty(form)
        .map_err(|err| StoreError::Storage(StorageError::Encode(err)))
}

fn prepare_body(form: &Form) -> StoreResult<Form> {
    let mut stored = form.clone();
    stored.normalize();
    stored.validate()?;
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::{prepare_create, prepare_update, stamp_update, StoreError};
    use crate::model::form::{FieldOption, FieldType, Form, FormField, FormValidationError};

    fn sample() -> Form {
        Form::new("f1", "Survey").with_field(
            FormField::new("pick", FieldType::Select, "Pick")
                .with_options(vec![FieldOption::new("a", "A")]),
        )
    }

    #[test]
    fn create_keeps_caller_created_at_and_sets_updated_at() {
        let mut form = sample();
        form.created_at = Some(10);

        let stored = prepare_create(&form, 500).unwrap();

        assert_eq!(stored.created_at, Some(10));
        assert_eq!(stored.updated_at, Some(500));
    }

    #[test]
    fn update_mismatch_is_reported_before_validation() {
        let mut form = sample();
        form.id = "f2".to_string();
        form.title.clear();

        let err = prepare_update("f1", &form).unwrap_err();

        assert!(matches!(
            err,
            StoreError::BadRequest(FormValidationError::IdMismatch { .. })
        ));
    }

    #[test]
    fn stamp_update_never_moves_updated_at_backwards() {
        let mut existing = sample();
        existing.created_at = Some(100);
        existing.updated_at = Some(900);
        let mut body = sample();
        body.created_at = Some(5);

        stamp_update(&mut body, &existing, 800);

        assert_eq!(body.created_at, Some(100));
        assert_eq!(body.updated_at, Some(900));
    }
}
