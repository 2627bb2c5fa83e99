//! Core of the form canvas builder.
//!
//! Owns the form document model, the editing reducer, the resize/move
//! gesture engine, and the form stores. UI layers drive it through
//! `LayoutController` and `FormService`.

pub mod config;
pub mod db;
pub mod editor;
pub mod layout;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig, StorageBackend};
pub use editor::{EditError, FormEvent};
pub use layout::controller::{GestureState, LayoutController, LayoutError, LayoutSurface};
pub use layout::geometry::{
    Point, ResizeDirection, Size, MIN_FIELD_HEIGHT, MIN_FIELD_WIDTH,
};
pub use logging::{init_from_config, init_logging, logging_status};
pub use model::data::{FormData, FormErrors};
pub use model::form::{
    FieldOption, FieldPosition, FieldStyle, FieldType, FieldValue, Form, FormField, FormModel,
    FormValidationError,
};
pub use repo::file_repo::{FileFormRepository, StorageRoot};
pub use repo::form_repo::{FormRepository, StorageError, StoreError, StoreResult};
pub use repo::sqlite_repo::SqliteFormRepository;
pub use service::form_service::FormService;
