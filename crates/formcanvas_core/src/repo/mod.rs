//! Form storage contracts and backends.
//!
//! # Responsibility
//! - Define the `FormRepository` contract (list/get/create/update/delete).
//! - Keep file-system and SQLite details behind that contract.
//!
//! # Invariants
//! - Writes validate and normalize documents before touching storage.
//! - Reads reject invalid persisted documents instead of masking them.
//! - Only a missing document (or missing root during `list`) is treated as
//!   an expected outcome; every other failure surfaces as `StorageError`.

pub mod file_repo;
pub mod form_repo;
pub mod sqlite_repo;
