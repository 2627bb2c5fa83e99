//! Use-case services.
//!
//! # Responsibility
//! - Present the form resource operations to UI/CLI callers.
//! - Keep callers independent of which storage backend is in use.

pub mod form_service;
