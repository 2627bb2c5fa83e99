use formcanvas_core::layout::geometry::resize_bounds;
use formcanvas_core::{
    FieldPosition, FieldType, Form, FormEvent, FormField, LayoutController, LayoutError,
    LayoutSurface, Point, ResizeDirection, Size, MIN_FIELD_HEIGHT, MIN_FIELD_WIDTH,
};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;

struct FakeSurface {
    origin: Point,
    boxes: HashMap<String, Size>,
}

impl FakeSurface {
    fn at(x: f64, y: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            boxes: HashMap::new(),
        }
    }

    fn with_box(mut self, field_id: &str, width: f64, height: f64) -> Self {
        self.boxes
            .insert(field_id.to_string(), Size::new(width, height));
        self
    }
}

impl LayoutSurface for FakeSurface {
    fn origin(&self) -> Point {
        self.origin
    }

    fn rendered_size(&self, field_id: &str) -> Option<Size> {
        self.boxes.get(field_id).copied()
    }
}

fn form_with_field_at(x: f64, y: f64) -> Form {
    Form::new("layout", "Layout").with_field(
        FormField::new("a", FieldType::Text, "A").with_position(FieldPosition::new(x, y)),
    )
}

fn controller() -> LayoutController<FakeSurface> {
    LayoutController::with_surface(
        form_with_field_at(10.0, 10.0),
        FakeSurface::at(0.0, 0.0).with_box("a", 120.0, 60.0),
    )
}

fn style_of(controller: &LayoutController<FakeSurface>) -> (Option<String>, Option<String>) {
    let field = controller.form().field("a").unwrap();
    (field.style.width.clone(), field.style.height.clone())
}

#[test]
fn southeast_drag_sets_box_under_pointer() {
    let mut controller = controller();

    controller.begin_resize("a", ResizeDirection::SE).unwrap();
    assert!(controller.pointer_move(Point::new(160.0, 90.0)));
    assert_eq!(controller.end_gesture().as_deref(), Some("a"));

    let field = controller.form().field("a").unwrap();
    assert_eq!(field.style.width.as_deref(), Some("150px"));
    assert_eq!(field.style.height.as_deref(), Some("80px"));
    assert_eq!((field.position.x, field.position.y), (10.0, 10.0));
    assert!(!controller.is_resizing());
}

#[test]
fn pointer_is_translated_by_surface_origin() {
    let mut controller = LayoutController::with_surface(
        form_with_field_at(10.0, 10.0),
        FakeSurface::at(100.0, 50.0).with_box("a", 120.0, 60.0),
    );

    controller.begin_resize("a", ResizeDirection::E).unwrap();
    controller.pointer_move(Point::new(360.0, 0.0));

    assert_eq!(style_of(&controller).0.as_deref(), Some("250px"));
    assert_eq!(style_of(&controller).1.as_deref(), Some("60px"));
}

#[test]
fn east_and_south_floors_apply() {
    let mut controller = controller();

    controller.begin_resize("a", ResizeDirection::SE).unwrap();
    controller.pointer_move(Point::new(20.0, 15.0));

    assert_eq!(
        style_of(&controller),
        (Some("100px".to_string()), Some("40px".to_string()))
    );
}

#[test]
fn northwest_drag_keeps_bottom_right_corner_fixed() {
    let mut controller = controller();

    controller.begin_resize("a", ResizeDirection::NW).unwrap();
    controller.pointer_move(Point::new(0.0, 5.0));

    let field = controller.form().field("a").unwrap();
    assert_eq!((field.position.x, field.position.y), (0.0, 5.0));
    assert_eq!(field.style.width.as_deref(), Some("130px"));
    assert_eq!(field.style.height.as_deref(), Some("65px"));
}

#[test]
fn west_floor_stops_left_edge_instead_of_pushing_right_edge() {
    let mut controller = controller();

    controller.begin_resize("a", ResizeDirection::W).unwrap();
    controller.pointer_move(Point::new(500.0, 0.0));

    let field = controller.form().field("a").unwrap();
    assert_eq!(field.style.width.as_deref(), Some("100px"));
    assert_eq!(field.position.x, 30.0);
    assert_eq!(field.position.y, 10.0);
}

#[test]
fn north_handle_leaves_width_alone() {
    let mut controller = controller();

    controller.begin_resize("a", ResizeDirection::N).unwrap();
    controller.pointer_move(Point::new(999.0, 0.0));

    let field = controller.form().field("a").unwrap();
    assert_eq!(field.style.width.as_deref(), Some("120px"));
    assert_eq!(field.style.height.as_deref(), Some("70px"));
    assert_eq!(field.position.y, 0.0);
}

#[test]
fn later_moves_are_relative_to_gesture_start() {
    let mut controller = controller();

    controller.begin_resize("a", ResizeDirection::E).unwrap();
    controller.pointer_move(Point::new(400.0, 0.0));
    controller.pointer_move(Point::new(210.0, 0.0));

    assert_eq!(style_of(&controller).0.as_deref(), Some("200px"));
    assert_eq!(
        controller.state().initial_size,
        Some(Size::new(120.0, 60.0))
    );
}

#[test]
fn pointer_move_while_idle_is_a_no_op() {
    let mut controller = controller();
    let before = controller.form().clone();

    assert!(!controller.pointer_move(Point::new(300.0, 300.0)));
    assert_eq!(controller.form(), &before);
    assert_eq!(controller.end_gesture(), None);
}

#[test]
fn starting_a_second_gesture_replaces_the_first() {
    let form = form_with_field_at(10.0, 10.0)
        .with_field(FormField::new("b", FieldType::Text, "B").with_position(FieldPosition::new(0.0, 200.0)));
    let surface = FakeSurface::at(0.0, 0.0)
        .with_box("a", 120.0, 60.0)
        .with_box("b", 150.0, 40.0);
    let mut controller = LayoutController::with_surface(form, surface);

    controller.begin_resize("a", ResizeDirection::E).unwrap();
    controller.begin_resize("b", ResizeDirection::S).unwrap();
    controller.pointer_move(Point::new(0.0, 300.0));

    let state = controller.state();
    assert_eq!(state.active_field_id.as_deref(), Some("b"));
    assert_eq!(state.direction, Some(ResizeDirection::S));
    assert_eq!(controller.form().field("a").unwrap().style.height, None);
    assert_eq!(
        controller.form().field("b").unwrap().style.height.as_deref(),
        Some("100px")
    );
}

#[test]
fn removing_the_active_field_ends_the_gesture() {
    let mut controller = controller();
    controller.begin_resize("a", ResizeDirection::SE).unwrap();

    controller
        .dispatch(FormEvent::RemoveField {
            field_id: "a".to_string(),
        })
        .unwrap();

    assert!(!controller.is_resizing());
    assert!(!controller.pointer_move(Point::new(200.0, 200.0)));
    assert!(controller.form().model.is_empty());
}

#[test]
fn begin_rejects_unknown_field_and_missing_surface() {
    let mut controller = controller();
    assert_eq!(
        controller.begin_resize("ghost", ResizeDirection::E),
        Err(LayoutError::FieldNotFound("ghost".to_string()))
    );

    let mut detached: LayoutController<FakeSurface> =
        LayoutController::new(form_with_field_at(0.0, 0.0));
    assert_eq!(
        detached.begin_resize("a", ResizeDirection::E),
        Err(LayoutError::SurfaceUnavailable)
    );
    assert_eq!(detached.active_field_id(), None);
}

#[test]
fn detached_surface_makes_moves_inert() {
    let mut controller = controller();
    controller.begin_resize("a", ResizeDirection::E).unwrap();
    controller.detach_surface();

    assert!(!controller.pointer_move(Point::new(400.0, 0.0)));
    assert_eq!(style_of(&controller).0, None);
}

#[test]
fn move_gesture_translates_without_resizing() {
    let mut controller = controller();

    controller
        .begin_move("a", Point::new(50.0, 50.0))
        .unwrap();
    assert!(!controller.is_resizing());
    controller.pointer_move(Point::new(80.0, 20.0));
    controller.end_gesture();

    let field = controller.form().field("a").unwrap();
    assert_eq!((field.position.x, field.position.y), (40.0, 0.0));
    assert_eq!(field.style.width, None);
    assert_eq!(field.position.z_index, 1);
}

#[test]
fn state_snapshot_describes_active_resize() {
    let mut controller = controller();
    controller.begin_resize("a", ResizeDirection::NE).unwrap();

    let state = controller.state();

    assert!(state.resizing);
    assert_eq!(state.active_field_id.as_deref(), Some("a"));
    assert_eq!(state.direction, Some(ResizeDirection::NE));
    assert_eq!(state.initial_position, Some(Point::new(10.0, 10.0)));
}

#[test]
fn resize_keeps_stacking_order() {
    let raised = FormField::new("a", FieldType::Text, "A").with_position(FieldPosition {
        x: 10.0,
        y: 10.0,
        z_index: 5,
    });
    let mut controller = LayoutController::with_surface(
        Form::new("layout", "Layout").with_field(raised),
        FakeSurface::at(0.0, 0.0).with_box("a", 120.0, 60.0),
    );

    controller.begin_resize("a", ResizeDirection::SE).unwrap();
    assert!(controller.pointer_move(Point::new(200.0, 150.0)));
    controller.end_gesture();

    let field = controller.form().field("a").unwrap();
    assert_eq!(field.style.width.as_deref(), Some("190px"));
    assert_eq!(field.position.z_index, 5);
}

#[test]
fn resize_commits_default_stacking_order_for_legacy_documents() {
    let form = Form::from_json_value(json!({
        "id": "legacy",
        "title": "Legacy",
        "model": {
            "a": { "id": "a", "type": "text", "label": "A", "position": { "x": 10, "y": 10 } }
        }
    }))
    .unwrap();
    let mut controller = LayoutController::with_surface(
        form,
        FakeSurface::at(0.0, 0.0).with_box("a", 120.0, 60.0),
    );

    controller.begin_resize("a", ResizeDirection::SE).unwrap();
    controller.pointer_move(Point::new(200.0, 150.0));
    controller.end_gesture();

    assert_eq!(controller.form().field("a").unwrap().position.z_index, 1);
}

#[test]
fn resize_works_on_fields_that_do_not_validate_yet() {
    let unfinished = Form::new("draft", "Draft")
        .with_field(FormField::new("s", FieldType::Select, "S"));
    assert!(unfinished.validate().is_err());
    let mut controller = LayoutController::with_surface(
        unfinished,
        FakeSurface::at(0.0, 0.0).with_box("s", 120.0, 60.0),
    );

    controller.begin_resize("s", ResizeDirection::E).unwrap();
    assert!(controller.pointer_move(Point::new(300.0, 0.0)));
    controller.end_gesture();

    let field = controller.form().field("s").unwrap();
    assert_eq!(field.style.width.as_deref(), Some("300px"));
    assert!(field.options.is_empty());
}

fn direction_strategy() -> impl Strategy<Value = ResizeDirection> {
    prop::sample::select(ResizeDirection::ALL.to_vec())
}

proptest! {
    #[test]
    fn resized_box_never_drops_below_floor(
        direction in direction_strategy(),
        x in 0.0f64..500.0,
        y in 0.0f64..500.0,
        width in MIN_FIELD_WIDTH..400.0,
        height in MIN_FIELD_HEIGHT..300.0,
        px in -1000.0f64..1000.0,
        py in -1000.0f64..1000.0,
    ) {
        let bounds = resize_bounds(
            direction,
            Point::new(x, y),
            Size::new(width, height),
            Point::new(px, py),
        );
        prop_assert!(bounds.width >= MIN_FIELD_WIDTH);
        prop_assert!(bounds.height >= MIN_FIELD_HEIGHT);
    }

    #[test]
    fn edges_opposite_the_handle_stay_fixed(
        direction in direction_strategy(),
        x in 0.0f64..500.0,
        y in 0.0f64..500.0,
        width in MIN_FIELD_WIDTH..400.0,
        height in MIN_FIELD_HEIGHT..300.0,
        px in -1000.0f64..1000.0,
        py in -1000.0f64..1000.0,
    ) {
        let bounds = resize_bounds(
            direction,
            Point::new(x, y),
            Size::new(width, height),
            Point::new(px, py),
        );
        let tolerance = 1e-9;
        if !direction.moves_west() {
            prop_assert!((bounds.x - x).abs() < tolerance);
        } else {
            prop_assert!((bounds.right() - (x + width)).abs() < tolerance);
        }
        if !direction.moves_north() {
            prop_assert!((bounds.y - y).abs() < tolerance);
        } else {
            prop_assert!((bounds.bottom() - (y + height)).abs() < tolerance);
        }
        if !direction.moves_east() && !direction.moves_west() {
            prop_assert!((bounds.width - width).abs() < tolerance);
        }
        if !direction.moves_north() && !direction.moves_south() {
            prop_assert!((bounds.height - height).abs() < tolerance);
        }
    }
}
