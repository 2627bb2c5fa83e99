//! JSON-file form repository.
//!
//! # Responsibility
//! - Persist one pretty-printed `<id>.json` document per form under a
//!   `StorageRoot`.
//!
//! # Invariants
//! - Documents are written to a temp file in the root, synced, then renamed
//!   over the target, so readers see the old or the new document, never a
//!   partial one.
//! - `create` renames without clobbering; losing a create race is `Conflict`.
//! - Temp files never end in `.json`, so `list` cannot pick them up.

use crate::model::form::Form;
use crate::repo::form_repo::{
    check_id, decode_stored, encode_document, log_rejection, now_epoch_ms, prepare_create,
    prepare_update, stamp_update, FormRepository, StorageError, StoreError, StoreResult,
};
use log::{error, info, warn};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

const DOCUMENT_EXTENSION: &str = "json";
const BACKEND: &str = "file";

/// Directory that holds form documents.
///
/// Constructed once at startup and handed to the repository; the directory
/// itself is created lazily on first `list`/`create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    path: PathBuf,
}

impl StorageRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the document for `id`. The id must already be checked.
    pub fn document_path(&self, id: &str) -> PathBuf {
        self.path.join(format!("{id}.{DOCUMENT_EXTENSION}"))
    }

    fn ensure_exists(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.path).map_err(|source| StorageError::io(&self.path, source))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    CreateNew,
    Replace,
}

/// File-system backed `FormRepository`.
#[derive(Debug, Clone)]
pub struct FileFormRepository {
    root: StorageRoot,
}

impl FileFormRepository {
    pub fn new(root: StorageRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    fn read_document(&self, id: &str) -> StoreResult<Form> {
        let path = self.root.document_path(id);
        let document = match fs::read_to_string(&path) {
            Ok(document) => document,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(err) => return Err(storage_failure("form_read", id, StorageError::io(path, err))),
        };
        decode_stored(id, &document).inspect_err(|err| {
            error!("event=form_read module=store status=error id={id} error={err}");
        })
    }

    fn write_document(&self, form: &Form, mode: WriteMode) -> StoreResult<()> {
        let target = self.root.document_path(&form.id);
        let body = encode_document(form)?;

        let mut temp = Builder::new()
            .prefix(".form-")
            .suffix(".tmp")
            .tempfile_in(self.root.path())
            .map_err(|err| {
                storage_failure("form_write", &form.id, StorageError::io(self.root.path(), err))
            })?;

        if let Err(err) = stage(&mut temp, body.as_bytes()) {
            return Err(storage_failure(
                "form_write",
                &form.id,
                StorageError::io(temp.path(), err),
            ));
        }

        let persisted = match mode {
            WriteMode::CreateNew => temp.persist_noclobber(&target),
            WriteMode::Replace => temp.persist(&target),
        };
        match persisted {
            Ok(_) => Ok(()),
            Err(err) if mode == WriteMode::CreateNew && err.error.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::Conflict(form.id.clone()))
            }
            Err(err) => Err(storage_failure(
                "form_write",
                &form.id,
                StorageError::io(target, err.error),
            )),
        }
    }
}

impl FormRepository for FileFormRepository {
    fn list_forms(&self) -> StoreResult<Vec<Form>> {
        self.root
            .ensure_exists()
            .map_err(|err| storage_failure("form_list", "-", err))?;

        let entries = match fs::read_dir(self.root.path()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(storage_failure(
                    "form_list",
                    "-",
                    StorageError::io(self.root.path(), err),
                ));
            }
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                storage_failure("form_list", "-", StorageError::io(self.root.path(), err))
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if check_id(id).is_err() {
                warn!(
                    "event=form_list module=store status=skip path={} reason=invalid_id",
                    path.display()
                );
                continue;
            }
            ids.push(id.to_string());
        }
        ids.sort();

        let mut forms = Vec::with_capacity(ids.len());
        for id in ids {
            match self.read_document(&id) {
                Ok(form) => forms.push(form),
                // Deleted between directory scan and read.
                Err(StoreError::NotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(forms)
    }

    fn get_form(&self, id: &str) -> StoreResult<Form> {
        check_id(id)
            .and_then(|()| self.read_document(id))
            .inspect_err(|err| log_rejection("form_get", BACKEND, id, err))
    }

    fn create_form(&self, form: &Form) -> StoreResult<Form> {
        let stored = prepare_create(form, now_epoch_ms())
            .inspect_err(|err| log_rejection("form_create", BACKEND, &form.id, err))?;
        self.root
            .ensure_exists()
            .map_err(|err| storage_failure("form_create", &stored.id, err))?;

        match self.write_document(&stored, WriteMode::CreateNew) {
            Ok(()) => {
                info!(
                    "event=form_create module=store status=ok backend=file id={} fields={}",
                    stored.id,
                    stored.model.len()
                );
                Ok(stored)
            }
            Err(StoreError::Conflict(id)) => {
                warn!("event=form_create module=store status=conflict backend=file id={id}");
                Err(StoreError::Conflict(id))
            }
            Err(err) => Err(err),
        }
    }

    fn update_form(&self, id: &str, form: &Form) -> StoreResult<Form> {
        let reject = |err: &StoreError| log_rejection("form_update", BACKEND, id, err);
        let mut stored = prepare_update(id, form).inspect_err(reject)?;
        let existing = self.read_document(id).inspect_err(reject)?;
        stamp_update(&mut stored, &existing, now_epoch_ms());

        self.write_document(&stored, WriteMode::Replace)?;
        info!(
            "event=form_update module=store status=ok backend=file id={} fields={}",
            stored.id,
            stored.model.len()
        );
        Ok(stored)
    }

    fn delete_form(&self, id: &str) -> StoreResult<()> {
        check_id(id).inspect_err(|err| log_rejection("form_delete", BACKEND, id, err))?;
        let path = self.root.document_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("event=form_delete module=store status=ok backend=file id={id}");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let err = StoreError::NotFound(id.to_string());
                log_rejection("form_delete", BACKEND, id, &err);
                Err(err)
            }
            Err(err) => Err(storage_failure("form_delete", id, StorageError::io(path, err))),
        }
    }
}

/// Writes the full document and flushes it to disk before the rename.
fn stage(temp: &mut NamedTempFile, body: &[u8]) -> std::io::Result<()> {
    temp.write_all(body)?;
    temp.write_all(b"\n")?;
    temp.as_file().sync_all()
}

fn storage_failure(event: &str, id: &str, err: StorageError) -> StoreError {
    error!("event={event} module=store status=error backend=file id={id} error={err}");
    StoreError::Storage(err)
}
