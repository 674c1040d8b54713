//! End-to-end tests against an in-memory schema: scalar create/read and
//! vector attribute groups (including the mismatched-length rejection).

use quiver::{Database, Element, Value};

const SCHEMA_SQL: &str = r#"
CREATE TABLE Configuration (id INTEGER PRIMARY KEY, label TEXT UNIQUE NOT NULL);
INSERT INTO Configuration (id, label) VALUES (1, 'default');

CREATE TABLE Fuel (id INTEGER PRIMARY KEY, label TEXT UNIQUE NOT NULL);
INSERT INTO Fuel (id, label) VALUES (1, 'Gas'), (2, 'Coal');

CREATE TABLE Plant (
    id INTEGER PRIMARY KEY,
    label TEXT UNIQUE NOT NULL,
    capacity_mw REAL,
    fuel_id INTEGER REFERENCES Fuel(id)
);

CREATE TABLE Plant_vector_cost (
    id INTEGER NOT NULL REFERENCES Plant(id) ON DELETE CASCADE ON UPDATE CASCADE,
    vector_index INTEGER NOT NULL,
    cost REAL,
    date_commissioning TEXT,
    PRIMARY KEY (id, vector_index)
);

CREATE TABLE Plant_set_tag (
    id INTEGER NOT NULL REFERENCES Plant(id) ON DELETE CASCADE,
    tag TEXT NOT NULL,
    UNIQUE (id, tag)
);
"#;

#[test]
fn creates_and_reads_a_scalar_element() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();

    let element = Element::new()
        .with_scalar("label", Value::Text("Plant 1".into()))
        .with_scalar("capacity_mw", Value::Real(42.5))
        .with_scalar("fuel_id", Value::Text("Gas".into()));
    let id = db.create_element("Plant", &element).unwrap();

    assert_eq!(db.read_scalar_by_id("Plant", id, "capacity_mw").unwrap(), Some(Value::Real(42.5)));
    // the FK label was pre-resolved to Fuel's integer id.
    assert_eq!(db.read_scalar_by_id("Plant", id, "fuel_id").unwrap(), Some(Value::Integer(1)));
}

#[test]
fn zips_vector_arrays_by_position() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    let element = Element::new()
        .with_scalar("label", Value::Text("Plant 1".into()))
        .with_array("cost", vec![Value::Real(1.0), Value::Real(2.0), Value::Real(3.0)])
        .with_array(
            "date_commissioning",
            vec![
                Value::Text("2020-01-01T00:00:00".into()),
                Value::Text("2021-01-01T00:00:00".into()),
                Value::Text("2022-01-01T00:00:00".into()),
            ],
        );
    let id = db.create_element("Plant", &element).unwrap();

    let costs = db.read_vector_by_id("Plant", id, "cost").unwrap();
    assert_eq!(costs, vec![Value::Real(1.0), Value::Real(2.0), Value::Real(3.0)]);
}

#[test]
fn rejects_mismatched_array_lengths_in_the_same_group() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    let element = Element::new()
        .with_scalar("label", Value::Text("Plant 1".into()))
        .with_array("cost", vec![Value::Real(1.0), Value::Real(2.0)])
        .with_array("date_commissioning", vec![Value::Text("2020-01-01T00:00:00".into())]);

    let err = db.create_element("Plant", &element).unwrap_err();
    assert!(err.to_string().contains("equal length"));
}

#[test]
fn reads_back_a_set_attribute_unordered() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    let element = Element::new()
        .with_scalar("label", Value::Text("Plant 1".into()))
        .with_array(
            "tag",
            vec![Value::Text("renewable".into()), Value::Text("baseload".into())],
        );
    let id = db.create_element("Plant", &element).unwrap();

    let mut tags: Vec<String> = db
        .read_set_by_id("Plant", id, "tag")
        .unwrap()
        .into_iter()
        .map(|v| v.as_text().unwrap().to_string())
        .collect();
    tags.sort();
    assert_eq!(tags, vec!["baseload".to_string(), "renewable".to_string()]);
}

#[test]
fn deletes_cascade_into_group_tables() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    let element = Element::new()
        .with_scalar("label", Value::Text("Plant 1".into()))
        .with_array("cost", vec![Value::Real(1.0)])
        .with_array("date_commissioning", vec![Value::Text("2020-01-01T00:00:00".into())]);
    let id = db.create_element("Plant", &element).unwrap();

    db.delete_element_by_id("Plant", id).unwrap();
    assert!(db.read_element("Plant", id).is_err());
    assert!(db.read_vector_by_id("Plant", id, "cost").unwrap().is_empty());
}

#[test]
fn rejects_an_unknown_fk_label() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    let element = Element::new()
        .with_scalar("label", Value::Text("Plant 1".into()))
        .with_scalar("fuel_id", Value::Text("Nuclear".into()));

    let err = db.create_element("Plant", &element).unwrap_err();
    assert!(err.to_string().contains("not found"));
}
