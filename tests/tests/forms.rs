use backoffice_tests::prelude::*;

use backoffice::forms::{
    scaffold_form, FormFieldTy, FormValidator, ModelConverter, ScaffoldOptions,
    ValidationOutcome,
};
use backoffice_core::schema::{ColumnTy, FieldDescriptor, ModelDescriptor};
use backoffice_core::stmt::Value as V;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn primary_and_foreign_keys_are_never_editable() {
    let (db, _driver) = test_db();
    let model = db.registry().model_by_name("Address").unwrap();

    let form = scaffold_form(&db, model, &ModelConverter::new(), &ScaffoldOptions::default())
        .await
        .unwrap();

    let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
    assert!(!names.contains(&"id"));
    assert!(!names.contains(&"user_id"));
    assert!(names.contains(&"email_address"));
    assert!(names.contains(&"user"));
}

#[tokio::test]
async fn nullability_drives_required_vs_optional() {
    let (db, _driver) = test_db();
    let model = db.registry().model_by_name("User").unwrap();

    let form = scaffold_form(&db, model, &ModelConverter::new(), &ScaffoldOptions::default())
        .await
        .unwrap();

    let name = form.field("name").unwrap();
    assert!(name
        .validators
        .contains(&FormValidator::InputRequired));
    assert!(name
        .validators
        .contains(&FormValidator::Length { max: 64 }));

    let email = form.field("email").unwrap();
    assert!(email.validators.contains(&FormValidator::Optional));

    // Checkboxes post nothing when unchecked, so booleans are optional even
    // when the column is not nullable.
    let active = form.field("active").unwrap();
    assert!(active.validators.contains(&FormValidator::Optional));
    assert!(matches!(active.ty, FormFieldTy::Checkbox));
}

#[tokio::test]
async fn relationship_fields_populate_choices_from_queries() {
    let (db, _driver) = test_db();
    fixtures::create_user(&db, "alice", None).await;
    fixtures::create_user(&db, "bob", None).await;

    let model = db.registry().model_by_name("Address").unwrap();
    let form = scaffold_form(&db, model, &ModelConverter::new(), &ScaffoldOptions::default())
        .await
        .unwrap();

    // Many-to-one renders as a single select with a blank choice (the
    // relation is nullable).
    match &form.field("user").unwrap().ty {
        FormFieldTy::Select {
            choices,
            allow_blank,
        } => {
            assert!(*allow_blank);
            assert_eq!(
                choices,
                &vec![
                    ("1".to_string(), "alice".to_string()),
                    ("2".to_string(), "bob".to_string()),
                ]
            );
        }
        other => panic!("expected a select field, got {other:?}"),
    }

    // To-many directions render as multi selects.
    let user_model = db.registry().model_by_name("User").unwrap();
    let user_form = scaffold_form(
        &db,
        user_model,
        &ModelConverter::new(),
        &ScaffoldOptions::default(),
    )
    .await
    .unwrap();
    assert!(matches!(
        user_form.field("addresses").unwrap().ty,
        FormFieldTy::SelectMultiple { .. }
    ));
    assert!(matches!(
        user_form.field("roles").unwrap().ty,
        FormFieldTy::SelectMultiple { .. }
    ));
}

#[tokio::test]
async fn callable_defaults_are_evaluated_once_per_build() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let registry = backoffice_core::Registry::builder()
        .model(
            ModelDescriptor::new("Gadget")
                .field(FieldDescriptor::column("id", ColumnTy::Integer).primary_key())
                .field(
                    FieldDescriptor::column("serial", ColumnTy::string()).default_fn(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                        V::String("generated".into())
                    }),
                ),
        )
        .build()
        .unwrap();
    let registry = Arc::new(registry);
    let driver = Arc::new(MemoryDriver::new(registry.clone()));
    let db = Db::new(registry, driver);

    let model = db.registry().model_by_name("Gadget").unwrap();
    let form = scaffold_form(&db, model, &ModelConverter::new(), &ScaffoldOptions::default())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        form.field("serial").unwrap().default,
        Some(V::String("generated".into()))
    );
}

#[tokio::test]
async fn computed_properties_fall_back_to_string_fields() {
    let registry = backoffice_core::Registry::builder()
        .model(
            ModelDescriptor::new("Invoice")
                .field(FieldDescriptor::column("id", ColumnTy::Integer).primary_key())
                .field(FieldDescriptor::column("amount", ColumnTy::Numeric))
                .field(FieldDescriptor::computed("reference"))
                .field(FieldDescriptor::computed_typed("total", ColumnTy::Numeric)),
        )
        .build()
        .unwrap();
    let registry = Arc::new(registry);
    let driver = Arc::new(MemoryDriver::new(registry.clone()));
    let db = Db::new(registry, driver);

    let model = db.registry().model_by_name("Invoice").unwrap();
    let form = scaffold_form(&db, model, &ModelConverter::new(), &ScaffoldOptions::default())
        .await
        .unwrap();

    // Untyped descriptor-only property: whitelisted best-effort string
    // field.
    assert!(matches!(
        form.field("reference").unwrap().ty,
        FormFieldTy::Text { max_length: None }
    ));
    // Typed computed property dispatches through its declared type.
    assert!(matches!(
        form.field("total").unwrap().ty,
        FormFieldTy::Decimal
    ));
}

#[tokio::test]
async fn missing_converter_fails_the_whole_form_build() {
    let (db, _driver) = test_db();
    let model = db.registry().model_by_name("User").unwrap();

    let err = scaffold_form(&db, model, &ModelConverter::empty(), &ScaffoldOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_unsupported_field_type());
}

#[tokio::test]
async fn validation_collects_cast_failures_per_field() {
    let (db, _driver) = test_db();
    let model = db.registry().model_by_name("User").unwrap();
    let form = scaffold_form(&db, model, &ModelConverter::new(), &ScaffoldOptions::default())
        .await
        .unwrap();

    let data = FormData::from_pairs([
        ("name", "alice"),
        ("created_at", "not-a-date"),
    ]);

    match form.validate(db.registry(), model, &data) {
        ValidationOutcome::Invalid(errors) => {
            assert!(errors.get("created_at").is_some());
            assert!(errors.get("name").is_none());
        }
        ValidationOutcome::Valid(_) => panic!("expected a validation failure"),
    }

    // A required field left empty is an inline error, not an exception.
    let data = FormData::from_pairs([("email", "a@example.com")]);
    match form.validate(db.registry(), model, &data) {
        ValidationOutcome::Invalid(errors) => {
            assert_eq!(errors.get("name"), Some("This field is required"));
        }
        ValidationOutcome::Valid(_) => panic!("expected a validation failure"),
    }
}
