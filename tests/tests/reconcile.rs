use backoffice_tests::prelude::*;

use backoffice::loader::RelationLoader;

#[tokio::test]
async fn one_to_many_reconciliation_repoints_and_nulls_foreign_keys() {
    let (db, _driver) = test_db();
    let user = fixtures::create_user(&db, "alice", None).await;
    let user_id = fixtures::pk(&db, &user);
    let address = fixtures::create_address(&db, "a@example.com", Some(user_id)).await;
    let address_id = fixtures::pk(&db, &address);

    let registry = db.registry_handle();
    let loader = RelationLoader::new(&registry);
    let addresses_field = registry
        .model_by_name("User")
        .unwrap()
        .field_by_name("addresses")
        .unwrap()
        .id;
    let address_model = registry.model_by_name("Address").unwrap();
    let fk = address_model.field_by_name("user_id").unwrap().id;

    // Submitting an empty id list re-points the linked address to null.
    let report = loader
        .reconcile_links(&db, &user, addresses_field, &[])
        .await
        .unwrap();
    assert_eq!(report.before.len(), 1);
    assert_eq!(report.after.len(), 0);
    assert_eq!(report.unlinked, vec![Value::I64(address_id)]);

    let detached = db
        .get_by_pk(address_model, &Value::I64(address_id))
        .await
        .unwrap()
        .unwrap();
    assert!(detached.value(fk).is_null());

    // Re-submitting the id re-links it.
    let report = loader
        .reconcile_links(&db, &user, addresses_field, &[Value::I64(address_id)])
        .await
        .unwrap();
    assert_eq!(report.before.len(), 0);
    assert_eq!(report.after.len(), 1);

    let relinked = db
        .get_by_pk(address_model, &Value::I64(address_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(relinked.value(fk), &Value::I64(user_id));
}

#[tokio::test]
async fn one_to_many_reconciliation_unlinks_only_absent_ids() {
    let (db, _driver) = test_db();
    let user = fixtures::create_user(&db, "alice", None).await;
    let user_id = fixtures::pk(&db, &user);
    let keep = fixtures::create_address(&db, "keep@example.com", Some(user_id)).await;
    let drop = fixtures::create_address(&db, "drop@example.com", Some(user_id)).await;

    let registry = db.registry_handle();
    let loader = RelationLoader::new(&registry);
    let addresses_field = registry
        .model_by_name("User")
        .unwrap()
        .field_by_name("addresses")
        .unwrap()
        .id;

    let keep_id = Value::I64(fixtures::pk(&db, &keep));
    let report = loader
        .reconcile_links(&db, &user, addresses_field, std::slice::from_ref(&keep_id))
        .await
        .unwrap();

    assert_eq!(report.before.len(), 2);
    assert_eq!(report.after.len(), 1);
    assert_eq!(report.unlinked, vec![Value::I64(fixtures::pk(&db, &drop))]);
    assert_eq!(report.after[0].value(registry.model_by_name("Address").unwrap().primary_key), &keep_id);
}

#[tokio::test]
async fn many_to_many_reconciliation_is_idempotent() {
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
    let link_model_id = registry.model_by_name("UserRoleLink").unwrap().id;

    let ids = vec![
        Value::I64(fixtures::pk(&db, &admin_role)),
        Value::I64(fixtures::pk(&db, &staff_role)),
    ];

    let first = loader
        .reconcile_links(&db, &user, roles_field, &ids)
        .await
        .unwrap();
    assert_eq!(first.linked.len(), 2);
    assert_eq!(driver.rows(link_model_id).len(), 2);

    // Same target-id list again: no duplicate association rows.
    let second = loader
        .reconcile_links(&db, &user, roles_field, &ids)
        .await
        .unwrap();
    assert_eq!(second.linked.len(), 0);
    assert_eq!(second.unlinked.len(), 0);
    assert_eq!(driver.rows(link_model_id).len(), 2);

    // A duplicated id within one submission inserts once.
    let dup = vec![ids[0].clone(), ids[0].clone()];
    loader
        .reconcile_links(&db, &user, roles_field, &dup)
        .await
        .unwrap();
    assert_eq!(driver.rows(link_model_id).len(), 1);
}

#[tokio::test]
async fn many_to_one_reconciliation_is_a_no_op() {
    let (db, _driver) = test_db();
    let user = fixtures::create_user(&db, "alice", None).await;
    let address =
        fixtures::create_address(&db, "a@example.com", Some(fixtures::pk(&db, &user))).await;

    let registry = db.registry_handle();
    let loader = RelationLoader::new(&registry);
    let user_field = registry
        .model_by_name("Address")
        .unwrap()
        .field_by_name("user")
        .unwrap()
        .id;

    let report = loader
        .reconcile_links(&db, &address, user_field, &[Value::I64(99)])
        .await
        .unwrap();
    assert!(report.before.is_empty());
    assert!(report.after.is_empty());
    assert!(report.linked.is_empty());
    assert!(report.unlinked.is_empty());
}
