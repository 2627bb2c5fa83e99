//! Form resource service.
//!
//! # Responsibility
//! - Expose list/get/create/update/delete over any `FormRepository`.
//! - Accept raw JSON bodies and classify malformed ones as `BadRequest`.
//! - Bridge stored documents to and from a `LayoutController` session.
//!
//! # Invariants
//! - The service never bypasses repository validation.
//! - Loading an editor never writes; saving is always explicit.

use crate::layout::controller::{LayoutController, LayoutSurface};
use crate::model::form::Form;
use crate::repo::form_repo::{FormRepository, StoreError, StoreResult};

/// Use-case facade over a form repository.
pub struct FormService<R: FormRepository> {
    repo: R,
}

impl<R: FormRepository> FormService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn list_forms(&self) -> StoreResult<Vec<Form>> {
        self.repo.list_forms()
    }

    pub fn get_form(&self, id: &str) -> StoreResult<Form> {
        self.repo.get_form(id)
    }

    pub fn create_form(&self, form: &Form) -> StoreResult<Form> {
        self.repo.create_form(form)
    }

    pub fn update_form(&self, id: &str, form: &Form) -> StoreResult<Form> {
        self.repo.update_form(id, form)
    }

    pub fn delete_form(&self, id: &str) -> StoreResult<()> {
        self.repo.delete_form(id)
    }

    /// Creates a form from a JSON request body.
    pub fn create_from_json(&self, body: &str) -> StoreResult<Form> {
        let form = Form::from_json_str(body)?;
        self.repo.create_form(&form)
    }

    /// Updates form `id` from a JSON request body.
    pub fn update_from_json(&self, id: &str, body: &str) -> StoreResult<Form> {
        let form = Form::from_json_str(body)?;
        self.repo.update_form(id, &form)
    }

    /// Loads a stored form into a fresh editing session.
    pub fn load_editor<S: LayoutSurface>(&self, id: &str) -> StoreResult<LayoutController<S>> {
        let form = self.repo.get_form(id)?;
        Ok(LayoutController::new(form))
    }

    /// Persists the session's form: update when it exists, create otherwise.
    ///
    /// Store-assigned timestamps are copied back into the session.
    pub fn save_editor<S: LayoutSurface>(
        &self,
        controller: &mut LayoutController<S>,
    ) -> StoreResult<Form> {
        let form = controller.form();
        let stored = match self.repo.update_form(&form.id, form) {
            Err(StoreError::NotFound(_)) => self.repo.create_form(form)?,
            other => other?,
        };
        controller.mark_saved(&stored);
        Ok(stored)
    }
}
