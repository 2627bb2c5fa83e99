//! SQLite form repository.
//!
//! # Responsibility
//! - Store the same JSON document the file backend writes, one row per form.
//!
//! # Invariants
//! - Only connections migrated by `db::open_db*` are accepted.
//! - `update` reads and rewrites inside one transaction.

use crate::db::migrations::{current_version, latest_version};
use crate::model::form::Form;
use crate::repo::form_repo::{
    check_id, decode_stored, encode_document, log_rejection, now_epoch_ms, prepare_create,
    prepare_update, stamp_update, FormRepository, StorageError, StoreError, StoreResult,
};
use log::{error, info, warn};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

const BACKEND: &str = "sqlite";

/// SQLite-backed `FormRepository` borrowing a migrated connection.
pub struct SqliteFormRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFormRepository<'conn> {
    /// Wraps `conn` after checking its schema is current.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let actual_version = current_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(StoreError::Storage(StorageError::UninitializedConnection {
                expected_version,
                actual_version,
            }));
        }

        let has_forms_table: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'forms'
            );",
            [],
            |row| row.get(0),
        )?;
        if !has_forms_table {
            return Err(StoreError::Storage(StorageError::MissingRequiredTable(
                "forms",
            )));
        }

        Ok(Self { conn })
    }

    fn load_document(&self, id: &str) -> StoreResult<Option<Form>> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM forms WHERE id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        document
            .map(|document| decode_stored(id, &document))
            .transpose()
    }
}

impl FormRepository for SqliteFormRepository<'_> {
    fn list_forms(&self) -> StoreResult<Vec<Form>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, document FROM forms ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;

        let mut forms = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let document: String = row.get(1)?;
            forms.push(decode_stored(&id, &document)?);
        }
        Ok(forms)
    }

    fn get_form(&self, id: &str) -> StoreResult<Form> {
        check_id(id)
            .and_then(|()| self.load_document(id))
            .and_then(|form| form.ok_or_else(|| StoreError::NotFound(id.to_string())))
            .inspect_err(|err| log_rejection("form_get", BACKEND, id, err))
    }

    fn create_form(&self, form: &Form) -> StoreResult<Form> {
        let stored = prepare_create(form, now_epoch_ms())
            .inspect_err(|err| log_rejection("form_create", BACKEND, &form.id, err))?;
        let document = encode_document(&stored)?;

        let inserted = self.conn.execute(
            "INSERT INTO forms (id, title, document, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                stored.id.as_str(),
                stored.title.as_str(),
                document,
                stored.created_at,
                stored.updated_at,
            ],
        );

        match inserted {
            Ok(_) => {
                info!(
                    "event=form_create module=store status=ok backend=sqlite id={} fields={}",
                    stored.id,
                    stored.model.len()
                );
                Ok(stored)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                warn!(
                    "event=form_create module=store status=conflict backend=sqlite id={}",
                    stored.id
                );
                Err(StoreError::Conflict(stored.id))
            }
            Err(err) => {
                error!(
                    "event=form_create module=store status=error backend=sqlite id={} error={err}",
                    stored.id
                );
                Err(err.into())
            }
        }
    }

    fn update_form(&self, id: &str, form: &Form) -> StoreResult<Form> {
        let reject = |err: &StoreError| log_rejection("form_update", BACKEND, id, err);
        let mut stored = prepare_update(id, form).inspect_err(reject)?;

        let tx = self.conn.unchecked_transaction()?;
        let existing = match self.load_document(id)? {
            Some(existing) => existing,
            None => {
                let err = StoreError::NotFound(id.to_string());
                reject(&err);
                return Err(err);
            }
        };
        stamp_update(&mut stored, &existing, now_epoch_ms());
        let document = encode_document(&stored)?;

        tx.execute(
            "UPDATE forms
             SET title = ?1, document = ?2, created_at = ?3, updated_at = ?4
             WHERE id = ?5;",
            params![
                stored.title.as_str(),
                document,
                stored.created_at,
                stored.updated_at,
                id,
            ],
        )?;
        tx.commit()?;

        info!(
            "event=form_update module=store status=ok backend=sqlite id={} fields={}",
            stored.id,
            stored.model.len()
        );
        Ok(stored)
    }

    fn delete_form(&self, id: &str) -> StoreResult<()> {
        check_id(id).inspect_err(|err| log_rejection("form_delete", BACKEND, id, err))?;
        let changed = self.conn.execute("DELETE FROM forms WHERE id = ?1;", [id])?;
        if changed == 0 {
            let err = StoreError::NotFound(id.to_string());
            log_rejection("form_delete", BACKEND, id, &err);
            return Err(err);
        }
        info!("event=form_delete module=store status=ok backend=sqlite id={id}");
        Ok(())
    }
}
