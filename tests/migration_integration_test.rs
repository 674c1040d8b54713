//! Versioned migration application and rollback.

use quiver::Database;

fn write_migration(dir: &std::path::Path, version: u32, name: &str, up: &str, down: &str) {
    std::fs::write(dir.join(format!("{version:04}_{name}.up.sql")), up).unwrap();
    std::fs::write(dir.join(format!("{version:04}_{name}.down.sql")), down).unwrap();
}

#[test]
fn applies_migrations_in_order_and_tracks_version() {
    let dir = tempfile::tempdir().unwrap();
    let migrations_dir = dir.path().join("migrations");
    std::fs::create_dir_all(&migrations_dir).unwrap();

    write_migration(
        &migrations_dir,
        1,
        "configuration",
        "CREATE TABLE Configuration (id INTEGER PRIMARY KEY, label TEXT UNIQUE NOT NULL); \
         INSERT INTO Configuration (id, label) VALUES (1, 'default');",
        "DROP TABLE Configuration;",
    );
    write_migration(
        &migrations_dir,
        2,
        "plant",
        "CREATE TABLE Plant (id INTEGER PRIMARY KEY, label TEXT UNIQUE NOT NULL);",
        "DROP TABLE Plant;",
    );

    let db_path = dir.path().join("db.duckdb");
    let mut db = Database::from_migrations(&db_path, &migrations_dir).unwrap();
    assert_eq!(db.current_migration_version().unwrap(), 2);
    assert!(db.schema().has_table("Plant"));

    db.revert_to(&migrations_dir, 1).unwrap();
    assert_eq!(db.current_migration_version().unwrap(), 1);
    assert!(!db.schema().has_table("Plant"));
}
