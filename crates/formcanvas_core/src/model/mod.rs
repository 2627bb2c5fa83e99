//! Form document model.
//!
//! # Responsibility
//! - Define the persisted `Form` document and its `FormField` controls.
//! - Own structural validation so stores and editors share one rule set.
//!
//! # Invariants
//! - Every key in `Form::model` equals the `id` of the field stored there.
//! - Choice fields (`select`, `radio`) always carry at least one option once
//!   validated.

pub mod data;
pub mod form;
