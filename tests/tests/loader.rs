use backoffice_tests::prelude::*;

use backoffice::loader::{LoadedRelation, RelationLoader};
use backoffice_core::schema::{
    ColumnTy, FieldDescriptor, ModelDescriptor, RelationDescriptor,
};

#[tokio::test]
async fn many_to_one_with_null_foreign_key_loads_nothing() {
    let (db, _driver) = test_db();
    let address = fixtures::create_address(&db, "a@example.com", None).await;

    let registry = db.registry_handle();
    let loader = RelationLoader::new(&registry);
    let field = registry
        .model_by_name("Address")
        .unwrap()
        .field_by_name("user")
        .unwrap()
        .id;

    // No query is built, let alone executed.
    assert!(loader.load(&address, field).unwrap().is_none());

    match loader.load_eager(&db, &address, field).await.unwrap() {
        LoadedRelation::One(None) => {}
        other => panic!("expected empty to-one load, got {other:?}"),
    }
}

#[tokio::test]
async fn many_to_one_resolves_the_pointed_at_row() {
    let (db, _driver) = test_db();
    let user = fixtures::create_user(&db, "alice", None).await;
    let address = fixtures::create_address(&db, "a@example.com", Some(fixtures::pk(&db, &user))).await;

    let registry = db.registry_handle();
    let loader = RelationLoader::new(&registry);
    let field = registry
        .model_by_name("Address")
        .unwrap()
        .field_by_name("user")
        .unwrap()
        .id;

    match loader.load_eager(&db, &address, field).await.unwrap() {
        LoadedRelation::One(Some(row)) => assert_eq!(row, user),
        other => panic!("expected the linked user, got {other:?}"),
    }
}

#[tokio::test]
async fn one_to_many_collects_rows_by_reciprocal_foreign_key() {
    let (db, _driver) = test_db();
    let user = fixtures::create_user(&db, "alice", None).await;
    let user_id = fixtures::pk(&db, &user);
    fixtures::create_address(&db, "a@example.com", Some(user_id)).await;
    fixtures::create_address(&db, "b@example.com", Some(user_id)).await;
    fixtures::create_address(&db, "other@example.com", None).await;

    let registry = db.registry_handle();
    let loader = RelationLoader::new(&registry);
    let field = registry
        .model_by_name("User")
        .unwrap()
        .field_by_name("addresses")
        .unwrap()
        .id;

    match loader.load_eager(&db, &user, field).await.unwrap() {
        LoadedRelation::Many(rows) => assert_eq!(rows.len(), 2),
        other => panic!("expected a collection, got {other:?}"),
    }
}

#[tokio::test]
async fn one_to_many_without_back_reference_is_a_configuration_error() {
    let registry = backoffice_core::Registry::builder()
        .model(
            ModelDescriptor::new("Solo")
                .field(FieldDescriptor::column("id", ColumnTy::Integer).primary_key())
                .field(FieldDescriptor::relation(
                    "items",
                    RelationDescriptor::new("Item").direction(Direction::OneToMany),
                )),
        )
        .model(
            ModelDescriptor::new("Item")
                .field(FieldDescriptor::column("id", ColumnTy::Integer).primary_key()),
        )
        .build()
        .unwrap();
    let registry = std::sync::Arc::new(registry);

    let solo = registry.model_by_name("Solo").unwrap();
    let field = solo.field_by_name("items").unwrap().id;
    let row = Row::new(solo.id, vec![Value::I64(1), Value::Null]);

    let loader = RelationLoader::new(&registry);
    let err = loader.load(&row, field).unwrap_err();
    assert!(err.is_relationship_configuration());
}

#[tokio::test]
async fn many_to_many_joins_through_the_association_model() {
    let (db, driver) = test_db();
    let user = fixtures::create_user(&db, "alice", None).await;
    let admin_role = fixtures::create_role(&db, "admin").await;
    let staff_role = fixtures::create_role(&db, "staff").await;

    let registry = db.registry_handle();
    let loader = RelationLoader::new(&registry);
    let roles_field = registry
        .model_by_name("User")
        .unwrap()
        .field_by_name("roles")
        .unwrap()
        .id;

    loader
        .reconcile_links(
            &db,
            &user,
            roles_field,
            &[
                Value::I64(fixtures::pk(&db, &admin_role)),
                Value::I64(fixtures::pk(&db, &staff_role)),
            ],
        )
        .await
        .unwrap();

    let query = loader.load(&user, roles_field).unwrap().unwrap();
    assert!(query.distinct);
    assert_eq!(query.joins.len(), 1);

    match loader.load_eager(&db, &user, roles_field).await.unwrap() {
        LoadedRelation::Many(rows) => assert_eq!(rows.len(), 2),
        other => panic!("expected the linked roles, got {other:?}"),
    }

    let link_model = registry.model_by_name("UserRoleLink").unwrap();
    assert_eq!(driver.rows(link_model.id).len(), 2);
}
