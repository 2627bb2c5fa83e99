use formcanvas_core::db::open_db_in_memory;
use formcanvas_core::{
    FieldType, FileFormRepository, FormEvent, FormRepository, FormService, FormValidationError,
    LayoutController, LayoutSurface, Point, ResizeDirection, Size, SqliteFormRepository,
    StorageRoot, StoreError,
};

struct Canvas;

impl LayoutSurface for Canvas {
    fn origin(&self) -> Point {
        Point::new(0.0, 0.0)
    }

    fn rendered_size(&self, _field_id: &str) -> Option<Size> {
        None
    }
}

const CONTACT_BODY: &str = r#"{
    "id": "contact",
    "title": "Contact",
    "model": {
        "name": { "id": "name", "type": "text", "label": "Name" }
    }
}"#;

fn file_service(dir: &tempfile::TempDir) -> FormService<FileFormRepository> {
    FormService::new(FileFormRepository::new(StorageRoot::new(dir.path())))
}

#[test]
fn json_bodies_create_and_update() {
    let dir = tempfile::tempdir().unwrap();
    let service = file_service(&dir);

    let created = service.create_from_json(CONTACT_BODY).unwrap();
    assert_eq!(created.id, "contact");

    let renamed = CONTACT_BODY.replace("\"Contact\"", "\"Contact us\"");
    let updated = service.update_from_json("contact", &renamed).unwrap();
    assert_eq!(updated.title, "Contact us");
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(service.list_forms().unwrap().len(), 1);
}

#[test]
fn malformed_bodies_are_bad_requests() {
    let dir = tempfile::tempdir().unwrap();
    let service = file_service(&dir);

    for body in ["[1, 2]", "not json", "{\"title\": \"No id\"}"] {
        let err = service.create_from_json(body).unwrap_err();
        assert!(
            matches!(err, StoreError::BadRequest(FormValidationError::Malformed(_))),
            "body {body}: {err}"
        );
        assert_eq!(err.status_code(), 400);
    }
    assert!(service.list_forms().unwrap().is_empty());
}

#[test]
fn update_from_json_checks_addressed_id() {
    let dir = tempfile::tempdir().unwrap();
    let service = file_service(&dir);
    service.create_from_json(CONTACT_BODY).unwrap();

    let err = service
        .update_from_json("other", CONTACT_BODY)
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::BadRequest(FormValidationError::IdMismatch { .. })
    ));
}

#[test]
fn editor_session_round_trips_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let service = file_service(&dir);
    let created = service.create_from_json(CONTACT_BODY).unwrap();

    let mut editor: LayoutController<Canvas> = service.load_editor("contact").unwrap();
    editor.attach_surface(Canvas);
    editor
        .dispatch(FormEvent::DropField {
            field_id: "topic".to_string(),
            kind: FieldType::Radio,
            at: Point::new(0.0, 60.0),
        })
        .unwrap();
    editor.begin_resize("name", ResizeDirection::E).unwrap();
    editor.pointer_move(Point::new(260.0, 0.0));
    editor.end_gesture();

    assert_eq!(service.get_form("contact").unwrap(), created);

    let saved = service.save_editor(&mut editor).unwrap();
    assert_eq!(editor.form().updated_at, saved.updated_at);
    assert_eq!(saved.created_at, created.created_at);

    let stored = service.get_form("contact").unwrap();
    assert_eq!(stored.model.len(), 2);
    assert_eq!(stored.field("name").unwrap().style.width.as_deref(), Some("260px"));
    assert_eq!(stored.field("topic").unwrap().position.z_index, 2);
}

#[test]
fn saving_a_new_editor_session_creates_the_form() {
    let conn = open_db_in_memory().unwrap();
    let service = FormService::new(SqliteFormRepository::try_new(&conn).unwrap());

    let form = formcanvas_core::Form::new("fresh", "Fresh");
    let mut editor: LayoutController<Canvas> = LayoutController::new(form);
    editor
        .dispatch(FormEvent::drop_field(FieldType::Email, Point::new(5.0, 5.0)))
        .unwrap();

    let saved = service.save_editor(&mut editor).unwrap();

    assert!(saved.created_at.is_some());
    assert_eq!(editor.form().created_at, saved.created_at);
    assert_eq!(service.repo().get_form("fresh").unwrap().model.len(), 1);
}

#[test]
fn load_editor_for_missing_form_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let service = file_service(&dir);

    let result: Result<LayoutController<Canvas>, _> = service.load_editor("ghost");

    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn boxed_repositories_are_interchangeable() {
    let dir = tempfile::tempdir().unwrap();
    let repo: Box<dyn FormRepository> =
        Box::new(FileFormRepository::new(StorageRoot::new(dir.path())));
    let service = FormService::new(repo);

    service.create_from_json(CONTACT_BODY).unwrap();
    service.delete_form("contact").unwrap();

    assert!(matches!(
        service.delete_form("contact"),
        Err(StoreError::NotFound(_))
    ));
}
