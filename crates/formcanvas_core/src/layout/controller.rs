//! Resize/move gesture state machine.
//!
//! # Responsibility
//! - Track the single active gesture (`Idle` or one field being resized or
//!   dragged) and translate pointer moves into `FormEvent::Reshape`.
//!
//! # Invariants
//! - `begin_*` while a gesture is active ends the active one first.
//! - `pointer_move` while idle, without a surface, or for a field that left
//!   the model is a no-op.
//! - Committed sizes never drop below `MIN_FIELD_WIDTH`/`MIN_FIELD_HEIGHT`.

use crate::editor::{EditError, FormEvent};
use crate::layout::geometry::{resize_bounds, Point, ResizeDirection, Size};
use crate::model::form::{FieldId, Form, FormField};
use log::{debug, trace};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rendering surface the form's fields are laid out on.
pub trait LayoutSurface {
    /// Top-left corner of the surface in pointer (client) coordinates.
    fn origin(&self) -> Point;

    /// Current rendered box of a field, if the field is on screen.
    fn rendered_size(&self, field_id: &str) -> Option<Size>;
}

impl<T: LayoutSurface + ?Sized> LayoutSurface for &T {
    fn origin(&self) -> Point {
        (**self).origin()
    }

    fn rendered_size(&self, field_id: &str) -> Option<Size> {
        (**self).rendered_size(field_id)
    }
}

/// Why a gesture could not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    FieldNotFound(FieldId),
    SurfaceUnavailable,
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldNotFound(id) => write!(f, "field not found: {id}"),
            Self::SurfaceUnavailable => write!(f, "no layout surface is attached"),
        }
    }
}

impl Error for LayoutError {}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureKind {
    Resize(ResizeDirection),
    /// Drag; remembers where the pointer went down.
    Move { pointer_start: Point },
}

#[derive(Debug, Clone, PartialEq)]
struct Gesture {
    field_id: FieldId,
    kind: GestureKind,
    initial_position: Point,
    initial_size: Size,
}

/// Snapshot of the controller's gesture state.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    pub active_field_id: Option<FieldId>,
    pub resizing: bool,
    pub direction: Option<ResizeDirection>,
    pub initial_size: Option<Size>,
    pub initial_position: Option<Point>,
}

/// Owns one form under edit and drives layout gestures on it.
pub struct LayoutController<S: LayoutSurface> {
    form: Form,
    surface: Option<S>,
    gesture: Option<Gesture>,
}

impl<S: LayoutSurface> LayoutController<S> {
    /// Creates a controller with no surface attached yet.
    pub fn new(form: Form) -> Self {
        Self {
            form,
            surface: None,
            gesture: None,
        }
    }

    pub fn with_surface(form: Form, surface: S) -> Self {
        Self {
            form,
            surface: Some(surface),
            gesture: None,
        }
    }

    pub fn attach_surface(&mut self, surface: S) {
        self.surface = Some(surface);
    }

    /// Detaches the surface; an active gesture becomes inert until one is
    /// attached again.
    pub fn detach_surface(&mut self) -> Option<S> {
        self.surface.take()
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn into_form(self) -> Form {
        self.form
    }

    /// Copies store-assigned timestamps after an explicit save.
    pub fn mark_saved(&mut self, stored: &Form) {
        if stored.id == self.form.id {
            self.form.created_at = stored.created_at;
            self.form.updated_at = stored.updated_at;
        }
    }

    /// Applies a non-gesture edit (label, options, drop, removal...).
    pub fn dispatch(&mut self, event: FormEvent) -> Result<(), EditError> {
        self.form.apply(event)?;
        let active_removed = self
            .gesture
            .as_ref()
            .is_some_and(|gesture| !self.form.model.contains_key(&gesture.field_id));
        if active_removed {
            self.gesture = None;
        }
        Ok(())
    }

    pub fn is_resizing(&self) -> bool {
        matches!(
            self.gesture,
            Some(Gesture {
                kind: GestureKind::Resize(_),
                ..
            })
        )
    }

    pub fn active_field_id(&self) -> Option<&str> {
        self.gesture.as_ref().map(|gesture| gesture.field_id.as_str())
    }

    pub fn state(&self) -> GestureState {
        match &self.gesture {
            None => GestureState {
                active_field_id: None,
                resizing: false,
                direction: None,
                initial_size: None,
                initial_position: None,
            },
            Some(gesture) => {
                let direction = match gesture.kind {
                    GestureKind::Resize(direction) => Some(direction),
                    GestureKind::Move { .. } => None,
                };
                GestureState {
                    active_field_id: Some(gesture.field_id.clone()),
                    resizing: direction.is_some(),
                    direction,
                    initial_size: Some(gesture.initial_size),
                    initial_position: Some(gesture.initial_position),
                }
            }
        }
    }

    /// Idle -> Resizing on a handle press.
    pub fn begin_resize(
        &mut self,
        field_id: &str,
        direction: ResizeDirection,
    ) -> Result<(), LayoutError> {
        self.begin(field_id, GestureKind::Resize(direction))
    }

    /// Starts dragging a field; `pointer` is in client coordinates.
    pub fn begin_move(&mut self, field_id: &str, pointer: Point) -> Result<(), LayoutError> {
        self.begin(
            field_id,
            GestureKind::Move {
                pointer_start: pointer,
            },
        )
    }

    /// Recomputes the active field's box for a pointer at `pointer`
    /// (client coordinates). Returns whether the form changed.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        let (Some(gesture), Some(surface)) = (self.gesture.as_ref(), self.surface.as_ref()) else {
            return false;
        };
        if !self.form.model.contains_key(&gesture.field_id) {
            return false;
        }

        let event = match gesture.kind {
            GestureKind::Resize(direction) => {
                let origin = surface.origin();
                let local = Point::new(pointer.x - origin.x, pointer.y - origin.y);
                let bounds = resize_bounds(
                    direction,
                    gesture.initial_position,
                    gesture.initial_size,
                    local,
                );
                FormEvent::Reshape {
                    field_id: gesture.field_id.clone(),
                    origin: Point::new(bounds.x, bounds.y),
                    size: Some(Size::new(bounds.width, bounds.height)),
                }
            }
            GestureKind::Move { pointer_start } => FormEvent::Reshape {
                field_id: gesture.field_id.clone(),
                origin: Point::new(
                    (gesture.initial_position.x + pointer.x - pointer_start.x).max(0.0),
                    (gesture.initial_position.y + pointer.y - pointer_start.y).max(0.0),
                ),
                size: None,
            },
        };

        match self.form.apply(event) {
            Ok(()) => true,
            Err(err) => {
                trace!("event=gesture_move module=layout status=error error={err}");
                false
            }
        }
    }

    /// Resizing/Moving -> Idle. The last computed box stays committed in the
    /// form. Returns the field that was active, if any.
    pub fn end_gesture(&mut self) -> Option<FieldId> {
        let gesture = self.gesture.take()?;
        if let Some(field) = self.form.field(&gesture.field_id) {
            debug!(
                "event=gesture_end module=layout status=ok field_id={} x={} y={} width={} height={}",
                field.id,
                field.position.x,
                field.position.y,
                field.style.width.as_deref().unwrap_or("auto"),
                field.style.height.as_deref().unwrap_or("auto"),
            );
        }
        Some(gesture.field_id)
    }

    fn begin(&mut self, field_id: &str, kind: GestureKind) -> Result<(), LayoutError> {
        let Some(field) = self.form.field(field_id) else {
            return Err(LayoutError::FieldNotFound(field_id.to_string()));
        };
        let Some(surface) = self.surface.as_ref() else {
            return Err(LayoutError::SurfaceUnavailable);
        };

        let initial_size = capture_size(surface, field);
        let initial_position = Point::new(field.position.x, field.position.y);

        if let Some(previous) = self.gesture.take() {
            debug!(
                "event=gesture_replaced module=layout status=ok previous_field_id={}",
                previous.field_id
            );
        }

        debug!(
            "event=gesture_start module=layout status=ok field_id={} kind={}",
            field_id,
            match kind {
                GestureKind::Resize(direction) => direction.as_str(),
                GestureKind::Move { .. } => "move",
            }
        );
        self.gesture = Some(Gesture {
            field_id: field_id.to_string(),
            kind,
            initial_position,
            initial_size,
        });
        Ok(())
    }
}

/// Rendered box first, then the stored style, then the drop default.
fn capture_size<S: LayoutSurface>(surface: &S, field: &FormField) -> Size {
    if let Some(size) = surface.rendered_size(&field.id) {
        return size;
    }
    let fallback = Size::default();
    Size::new(
        field.style.width_px().unwrap_or(fallback.width),
        field.style.height_px().unwrap_or(fallback.height),
    )
}

#[cfg(test)]
mod tests {
    use super::{LayoutController, LayoutSurface};
    use crate::layout::geometry::{Point, ResizeDirection, Size};
    use crate::model::form::{FieldType, Form, FormField};

    struct NoBoxes;

    impl LayoutSurface for NoBoxes {
        fn origin(&self) -> Point {
            Point::default()
        }

        fn rendered_size(&self, _field_id: &str) -> Option<Size> {
            None
        }
    }

    #[test]
    fn unrendered_field_falls_back_to_stored_style_size() {
        let mut field = FormField::new("a", FieldType::Text, "Name");
        field.style.set_size_px(180.0, 50.0);
        let form = Form::new("f1", "T").with_field(field);
        let mut controller = LayoutController::with_surface(form, NoBoxes);

        controller.begin_resize("a", ResizeDirection::E).unwrap();

        assert_eq!(
            controller.state().initial_size,
            Some(Size::new(180.0, 50.0))
        );
    }
}
