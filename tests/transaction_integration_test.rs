//! The public transaction facade and its interaction with internal guards.

use quiver::{Database, Element, Value};

const SCHEMA_SQL: &str = r#"
CREATE TABLE Configuration (id INTEGER PRIMARY KEY, label TEXT UNIQUE NOT NULL);
INSERT INTO Configuration (id, label) VALUES (1, 'default');

CREATE TABLE Plant (id INTEGER PRIMARY KEY, label TEXT UNIQUE NOT NULL);
"#;

#[test]
fn nested_begin_transaction_is_rejected() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    db.begin_transaction().unwrap();
    let err = db.begin_transaction().unwrap_err();
    assert!(err.to_string().contains("already open"));
    db.rollback().unwrap();
}

#[test]
fn commit_without_a_transaction_is_rejected() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    let err = db.commit().unwrap_err();
    assert!(err.to_string().contains("no transaction"));
}

#[test]
fn internal_writes_join_an_already_open_outer_transaction() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    db.begin_transaction().unwrap();
    let id = db
        .create_element("Plant", &Element::new().with_scalar("label", Value::Text("Plant 1".into())))
        .unwrap();
    assert!(db.in_transaction());
    db.commit().unwrap();
    assert!(!db.in_transaction());
    assert_eq!(db.read_scalar_by_id("Plant", id, "label").unwrap(), Some(Value::Text("Plant 1".into())));
}
