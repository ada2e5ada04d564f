use backoffice_tests::prelude::*;

use backoffice::admin::SubmitOutcome;
use backoffice::params::SortDirection;

fn pk_str(outcome: &SubmitOutcome) -> String {
    match outcome {
        SubmitOutcome::Saved { pk, .. } => pk.to_string(),
        SubmitOutcome::Invalid(errors) => panic!("unexpected validation failure: {errors:?}"),
    }
}

#[tokio::test]
async fn creating_a_child_row_sets_its_foreign_key() {
    let (db, driver) = test_db();
    let user = fixtures::create_user(&db, "alice", None).await;
    let user_id = fixtures::pk(&db, &user);

    let admin = ModelAdmin::new(db.clone(), "Address").unwrap();
    let user_choice = user_id.to_string();
    let outcome = admin
        .create(&FormData::from_pairs([
            ("email_address", "home@example.com"),
            ("user", user_choice.as_str()),
        ]))
        .await
        .unwrap();
    pk_str(&outcome);

    let address_model = db.registry().model_by_name("Address").unwrap();
    let rows = driver.rows(address_model.id);
    assert_eq!(rows.len(), 1);

    let fk = address_model.field_by_name("user_id").unwrap();
    assert_eq!(rows[0].value(fk), &Value::I64(user_id));
}

#[tokio::test]
async fn editing_the_parent_relinks_and_unlinks_children() {
    let (db, _driver) = test_db();
    let user = fixtures::create_user(&db, "alice", Some("alice@example.com")).await;
    let user_id = fixtures::pk(&db, &user);
    let address = fixtures::create_address(&db, "home@example.com", Some(user_id)).await;
    let address_id = fixtures::pk(&db, &address);

    let admin = ModelAdmin::new(db.clone(), "User").unwrap();
    let address_model = db.registry().model_by_name("Address").unwrap();
    let fk = address_model.field_by_name("user_id").unwrap();

    // Submitting an empty address list nulls the child's foreign key.
    let base = [
        ("name", "alice"),
        ("email", "alice@example.com"),
        ("active", "on"),
    ];
    admin
        .edit(&user_id.to_string(), &FormData::from_pairs(base))
        .await
        .unwrap();

    let detached = db
        .get_by_pk(address_model, &Value::I64(address_id))
        .await
        .unwrap()
        .unwrap();
    assert!(detached.value(fk).is_null());

    // Re-submitting with the address id re-links it.
    let mut data = FormData::from_pairs(base);
    data.append("addresses", address_id.to_string());
    admin.edit(&user_id.to_string(), &data).await.unwrap();

    let relinked = db
        .get_by_pk(address_model, &Value::I64(address_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(relinked.value(fk), &Value::I64(user_id));
}

#[tokio::test]
async fn list_view_filters_sorts_and_preserves_state_in_links() {
    let (db, _driver) = test_db();
    fixtures::create_user(&db, "alice", Some("alice@mail.com")).await;
    fixtures::create_user(&db, "bob", Some("bob@site.org")).await;
    fixtures::create_user(&db, "carol", Some("carol@web.com")).await;

    let admin = ModelAdmin::new(db.clone(), "User").unwrap();
    let page = admin
        .list("User__email__ilike=%25.com%25&o=User__name__d")
        .await
        .unwrap();

    // Filtered to .com addresses, ordered descending by name.
    let user_model = db.registry().model_by_name("User").unwrap();
    let name_field = user_model.field_by_name("name").unwrap();
    let names: Vec<&str> = page
        .rows
        .iter()
        .filter_map(|row| row.value(name_field).as_str())
        .collect();
    assert_eq!(names, vec!["carol", "alice"]);
    assert_eq!(page.pagination.count, 2);

    // The name column's "toggle sort" link keeps the email filter intact.
    let name_header = page
        .headers
        .iter()
        .find(|header| header.field == "name")
        .unwrap();
    let ascending = name_header
        .sort_options
        .iter()
        .find(|option| option.direction == SortDirection::Ascending)
        .unwrap();
    assert!(ascending
        .url_query
        .contains("User__email__ilike=%25.com%25"));
    assert!(ascending.url_query.contains("o=User__name__a"));
    assert!(!ascending.is_active);

    // The active descending option is marked.
    assert!(name_header
        .sort_options
        .iter()
        .find(|option| option.direction == SortDirection::Descending)
        .unwrap()
        .is_active);
}

#[tokio::test]
async fn bad_filter_operands_surface_as_validation_errors() {
    let (db, _driver) = test_db();
    fixtures::create_user(&db, "alice", None).await;

    let admin = ModelAdmin::new(db, "User").unwrap();
    let err = admin.list("User__id__exact=abc").await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn detail_and_delete_resolve_rows_by_primary_key() {
    let (db, driver) = test_db();
    let user = fixtures::create_user(&db, "alice", None).await;
    let user_id = fixtures::pk(&db, &user);

    let admin = ModelAdmin::new(db.clone(), "User").unwrap();

    let row = admin.detail(&user_id.to_string()).await.unwrap();
    assert_eq!(row, user);

    let err = admin.detail("999").await.unwrap_err();
    assert!(err.is_record_not_found());

    admin.delete(&user_id.to_string()).await.unwrap();
    let user_model = db.registry().model_by_name("User").unwrap();
    assert!(driver.rows(user_model.id).is_empty());
}

#[tokio::test]
async fn create_validation_failures_are_returned_inline() {
    let (db, _driver) = test_db();
    let admin = ModelAdmin::new(db, "User").unwrap();

    // Required name missing.
    let outcome = admin.create(&FormData::new()).await.unwrap();
    match outcome {
        SubmitOutcome::Invalid(errors) => {
            assert_eq!(errors.get("name"), Some("This field is required"));
        }
        SubmitOutcome::Saved { .. } => panic!("expected a validation failure"),
    }
}

#[tokio::test]
async fn capability_flags_and_predicates_gate_actions() {
    use backoffice::admin::Action;

    let (db, _driver) = test_db();
    let mut admin = ModelAdmin::new(db, "User").unwrap();
    assert!(admin.can(Action::Delete));

    admin.config.can_delete = false;
    assert!(!admin.can(Action::Delete));
    assert!(admin.can(Action::Edit));

    // The predicate narrows, it never widens.
    let admin = admin.with_accessible(|action| action != Action::Edit);
    assert!(!admin.can(Action::Edit));
    assert!(!admin.can(Action::Delete));
    assert!(admin.can(Action::List));
}

#[tokio::test]
async fn pagination_limits_list_pages() {
    let (db, _driver) = test_db();
    for i in 0..25 {
        fixtures::create_user(&db, &format!("user{i:02}"), None).await;
    }

    let admin = ModelAdmin::new(db, "User").unwrap();
    let page = admin.list("page=2&page_size=10").await.unwrap();

    assert_eq!(page.pagination.count, 25);
    assert_eq!(page.pagination.max_page(), 3);
    assert_eq!(page.rows.len(), 10);
    assert!(page.pagination.has_next());
    assert!(page.pagination.has_previous());
}
