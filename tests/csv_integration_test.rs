//! CSV export/import round-trip, including FK label rewriting on import.

use quiver::csv::load_csv_options;
use quiver::{CsvOptions, Database, Element, Value};

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
"#;

#[test]
fn round_trips_scalar_csv_with_fk_labels() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    let id1 = db
        .create_element(
            "Plant",
            &Element::new()
                .with_scalar("label", Value::Text("Plant 1".into()))
                .with_scalar("capacity_mw", Value::Real(10.0))
                .with_scalar("fuel_id", Value::Text("Gas".into())),
        )
        .unwrap();
    db.create_element(
        "Plant",
        &Element::new()
            .with_scalar("label", Value::Text("Plant 2".into()))
            .with_scalar("capacity_mw", Value::Real(20.0))
            .with_scalar("fuel_id", Value::Text("Coal".into())),
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("plants.csv");
    db.export_csv("Plant", None, &csv_path, &CsvOptions::new()).unwrap();

    let contents = std::fs::read_to_string(&csv_path).unwrap();
    assert!(contents.starts_with("sep=,\n"));
    assert!(contents.contains("label,capacity_mw,fuel_id"));
    assert!(contents.contains("Gas"));

    // Re-import into a fresh database sharing the same Fuel rows; scalar
    // import wipes and reloads Plant only.
    db.import_csv("Plant", None, &csv_path, &CsvOptions::new()).unwrap();

    let ids = db.read_element_ids("Plant").unwrap();
    assert_eq!(ids.len(), 2);
    let reimported_id = db.label_to_id("Plant", "Plant 1").unwrap();
    assert_ne!(reimported_id, 0);
    assert_eq!(
        db.read_scalar_by_id("Plant", reimported_id, "fuel_id").unwrap(),
        Some(Value::Integer(1))
    );
    let _ = id1;
}

#[test]
fn rejects_csv_with_unknown_fk_label() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("plants.csv");
    std::fs::write(
        &csv_path,
        "sep=,\nlabel,capacity_mw,fuel_id\nPlant 1,10,Nuclear\n",
    )
    .unwrap();

    let err = db.import_csv("Plant", None, &csv_path, &CsvOptions::new()).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn rejects_csv_missing_a_required_column() {
    let db = Database::from_schema(SCHEMA_SQL).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("plants.csv");
    std::fs::write(&csv_path, "label,capacity_mw\nPlant 1,10\n").unwrap();

    let err = db.import_csv("Plant", None, &csv_path, &CsvOptions::new()).unwrap_err();
    assert!(err.to_string().contains("do not match"));
}

#[test]
fn loads_enum_labels_from_a_yaml_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("csv.yaml");
    std::fs::write(
        &config_path,
        "date_time_format: \"%Y-%m-%d\"\n\
         enum_labels:\n\
         \x20\x20fuel_id:\n\
         \x20\x20\x20\x20en:\n\
         \x20\x20\x20\x20\x20\x20Gas: 1\n\
         \x20\x20\x20\x20\x20\x20Coal: 2\n",
    )
    .unwrap();

    let options = load_csv_options(&config_path).unwrap();
    assert_eq!(options.date_time_format, "%Y-%m-%d");
    assert_eq!(options.value_for("fuel_id", "gas"), Some(1));
    assert_eq!(options.label_for("fuel_id", 2), Some("Coal"));
}
