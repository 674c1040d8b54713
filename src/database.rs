//! The `Database` facade: owns one DuckDB connection, the cached schema,
//! the type validator, and the shared transaction state. Every public
//! operation in the crate is a method here, delegating to the per-concern
//! modules (`writer`, `reader`, `migration`, `time_series`, `csv`, `query`).

use std::path::{Path, PathBuf};
use std::sync::Once;

use duckdb::Connection;
use tracing::instrument;

use crate::csv::{self, CsvOptions};
use crate::element::Element;
use crate::error::Result;
use crate::migration::{MigrationRunner, MigrationSet};
use crate::query;
use crate::reader::ElementReader;
use crate::schema::{ColumnDefinition, GroupMetadata, ScalarMetadata, Schema};
use crate::time_series::{TimeSeriesReader, TimeSeriesWriter};
use crate::transaction::TransactionState;
use crate::validator::{SchemaValidator, TypeValidator};
use crate::value::Value;
use crate::writer::ElementWriter;

static ENGINE_INIT: Once = Once::new();

/// Open-mode and resource knobs for [`Database::open_with_options`].
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub read_only: bool,
    pub memory_limit: Option<String>,
    pub enforce_foreign_keys: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            memory_limit: None,
            enforce_foreign_keys: true,
        }
    }
}

/// An embedded attribute-oriented database: collections, elements, and
/// scalar/vector/set/time-series attribute groups, atop a DuckDB file.
///
/// `Database` is intentionally `!Sync`: `duckdb::Connection` is not `Sync`,
/// so callers must use one `Database` per thread or synchronize externally.
pub struct Database {
    conn: Connection,
    schema: Schema,
    tx: TransactionState,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the DuckDB file at `path`, loading and validating
    /// the schema already present in it. Use [`Database::from_schema`] or
    /// [`Database::from_migrations`] to bootstrap an empty file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &DatabaseOptions::default())
    }

    #[instrument(skip(options), fields(path = %path.as_ref().display()))]
    pub fn open_with_options(path: impl AsRef<Path>, options: &DatabaseOptions) -> Result<Self> {
        init_engine_once();
        let path = path.as_ref().to_path_buf();
        let conn = if options.read_only {
            Connection::open_with_flags(&path, duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?)?
        } else {
            Connection::open(&path)?
        };
        if let Some(limit) = &options.memory_limit {
            conn.execute_batch(&format!("SET memory_limit='{limit}'"))?;
        }

        let schema = crate::schema::load_schema(&conn)?;
        SchemaValidator::new(&schema).validate()?;

        tracing::info!(path = %path.display(), tables = schema.table_names().count(), "opened database");
        Ok(Self {
            conn,
            schema,
            tx: TransactionState::default(),
            path: Some(path),
        })
    }

    /// Open an in-memory database and apply `schema_sql` directly.
    pub fn from_schema(schema_sql: &str) -> Result<Self> {
        init_engine_once();
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema_sql)?;
        let runner = MigrationRunner { conn: &conn };
        runner.ensure_metadata_table()?;
        let schema = crate::schema::load_schema(&conn)?;
        SchemaValidator::new(&schema).validate()?;
        Ok(Self {
            conn,
            schema,
            tx: TransactionState::default(),
            path: None,
        })
    }

    /// Open (or create) `path` and apply every pending migration in `migrations_dir`.
    pub fn from_migrations(path: impl AsRef<Path>, migrations_dir: impl AsRef<Path>) -> Result<Self> {
        init_engine_once();
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        let set = MigrationSet::load(migrations_dir.as_ref())?;
        let runner = MigrationRunner { conn: &conn };
        runner.migrate_up(&set)?;
        let schema = crate::schema::load_schema(&conn)?;
        SchemaValidator::new(&schema).validate()?;
        Ok(Self {
            conn,
            schema,
            tx: TransactionState::default(),
            path: Some(path),
        })
    }

    /// Open (or create) `path` with no existing schema and apply
    /// `schema_sql_path` directly, recording it as migration version 1.
    pub fn bootstrap_with_schema_file(path: impl AsRef<Path>, schema_sql_path: impl AsRef<Path>) -> Result<Self> {
        init_engine_once();
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        MigrationRunner { conn: &conn }.apply_schema_file(schema_sql_path.as_ref())?;
        let schema = crate::schema::load_schema(&conn)?;
        SchemaValidator::new(&schema).validate()?;
        Ok(Self {
            conn,
            schema,
            tx: TransactionState::default(),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn type_validator(&self) -> TypeValidator<'_> {
        TypeValidator::new(&self.schema)
    }

    fn writer(&self) -> ElementWriter<'_> {
        ElementWriter {
            conn: &self.conn,
            schema: &self.schema,
            types: self.type_validator(),
            tx: &self.tx,
        }
    }

    fn reader(&self) -> ElementReader<'_> {
        ElementReader {
            conn: &self.conn,
            schema: &self.schema,
        }
    }

    fn time_series_reader(&self) -> TimeSeriesReader<'_> {
        TimeSeriesReader {
            conn: &self.conn,
            schema: &self.schema,
        }
    }

    fn time_series_writer(&self) -> TimeSeriesWriter<'_> {
        TimeSeriesWriter {
            conn: &self.conn,
            schema: &self.schema,
            tx: &self.tx,
        }
    }

    // -- element CRUD ----------------------------------------------------

    pub fn create_element(&self, collection: &str, element: &Element) -> Result<i64> {
        self.writer().create_element(collection, element)
    }

    pub fn update_element(&self, collection: &str, id: i64, element: &Element) -> Result<()> {
        self.writer().update_element(collection, id, element)
    }

    pub fn delete_element_by_id(&self, collection: &str, id: i64) -> Result<()> {
        self.writer().delete_element_by_id(collection, id)
    }

    pub fn update_scalar_relation(&self, collection: &str, attribute: &str, from_label: &str, to_label: &str) -> Result<()> {
        self.writer().update_scalar_relation(collection, attribute, from_label, to_label)
    }

    // -- reads -------------------------------------------------------------

    pub fn read_element(&self, collection: &str, id: i64) -> Result<Element> {
        self.reader().read_element(collection, id)
    }

    pub fn read_scalar_by_id(&self, collection: &str, id: i64, attribute: &str) -> Result<Option<Value>> {
        self.reader().read_scalar_by_id(collection, id, attribute)
    }

    pub fn read_scalar(&self, collection: &str, attribute: &str) -> Result<Vec<Value>> {
        self.reader().read_scalar(collection, attribute)
    }

    pub fn read_vector_by_id(&self, collection: &str, id: i64, attribute: &str) -> Result<Vec<Value>> {
        self.reader().read_vector_by_id(collection, id, attribute)
    }

    pub fn read_vector(&self, collection: &str, attribute: &str) -> Result<Vec<Vec<Value>>> {
        self.reader().read_vector(collection, attribute)
    }

    pub fn read_set_by_id(&self, collection: &str, id: i64, attribute: &str) -> Result<Vec<Value>> {
        self.reader().read_set_by_id(collection, id, attribute)
    }

    pub fn read_set(&self, collection: &str, attribute: &str) -> Result<Vec<Vec<Value>>> {
        self.reader().read_set(collection, attribute)
    }

    pub fn read_element_ids(&self, collection: &str) -> Result<Vec<i64>> {
        self.reader().read_element_ids(collection)
    }

    pub fn label_to_id(&self, collection: &str, label: &str) -> Result<i64> {
        self.reader().label_to_id(collection, label)
    }

    pub fn id_to_label(&self, collection: &str, id: i64) -> Result<String> {
        self.reader().id_to_label(collection, id)
    }

    pub fn list_scalar_attributes(&self, collection: &str) -> Result<Vec<ColumnDefinition>> {
        self.reader().list_scalar_attributes(collection)
    }

    pub fn list_vector_groups(&self, collection: &str) -> Vec<String> {
        self.reader().list_vector_groups(collection)
    }

    pub fn list_set_groups(&self, collection: &str) -> Vec<String> {
        self.reader().list_set_groups(collection)
    }

    pub fn list_time_series_groups(&self, collection: &str) -> Vec<String> {
        self.reader().list_time_series_groups(collection)
    }

    // -- metadata introspection ---------------------------------------------

    pub fn get_scalar_metadata(&self, collection: &str, attribute: &str) -> Result<ScalarMetadata> {
        self.schema.get_scalar_metadata(collection, attribute)
    }

    pub fn get_vector_metadata(&self, collection: &str, group: &str) -> Result<GroupMetadata> {
        self.schema.get_vector_metadata(collection, group)
    }

    pub fn get_set_metadata(&self, collection: &str, group: &str) -> Result<GroupMetadata> {
        self.schema.get_set_metadata(collection, group)
    }

    pub fn get_time_series_metadata(&self, collection: &str, group: &str) -> Result<GroupMetadata> {
        self.schema.get_time_series_metadata(collection, group)
    }

    // -- time series ---------------------------------------------------------

    pub fn read_time_series(&self, collection: &str, id: i64, attribute: &str) -> Result<Vec<(String, Value)>> {
        self.time_series_reader().read_time_series(collection, id, attribute)
    }

    pub fn update_time_series(&self, collection: &str, id: i64, attribute: &str, series: &[(String, Value)]) -> Result<()> {
        self.time_series_writer().update_time_series(collection, id, attribute, series)
    }

    pub fn has_time_series_files(&self, collection: &str) -> bool {
        self.time_series_reader().has_time_series_files(collection)
    }

    pub fn list_time_series_files_columns(&self, collection: &str) -> Result<Vec<String>> {
        self.time_series_reader().list_time_series_files_columns(collection)
    }

    pub fn read_time_series_files(&self, collection: &str) -> Result<ahash::AHashMap<String, Option<String>>> {
        self.time_series_reader().read_time_series_files(collection)
    }

    pub fn update_time_series_files(&self, collection: &str, values: &ahash::AHashMap<String, Option<String>>) -> Result<()> {
        self.time_series_writer().update_time_series_files(collection, values)
    }

    // -- CSV -------------------------------------------------------------

    pub fn export_csv(&self, collection: &str, group: Option<&str>, destination: impl AsRef<Path>, options: &CsvOptions) -> Result<()> {
        csv::export_csv(&self.conn, &self.schema, collection, group, destination.as_ref(), options)
    }

    pub fn import_csv(&self, collection: &str, group: Option<&str>, source: impl AsRef<Path>, options: &CsvOptions) -> Result<()> {
        csv::import_csv(&self.conn, &self.schema, &self.tx, collection, group, source.as_ref(), options)
    }

    // -- migrations ------------------------------------------------------

    pub fn migrate_up(&mut self, migrations_dir: impl AsRef<Path>) -> Result<i64> {
        let set = MigrationSet::load(migrations_dir.as_ref())?;
        let version = MigrationRunner { conn: &self.conn }.migrate_up(&set)?;
        self.schema = crate::schema::load_schema(&self.conn)?;
        Ok(version)
    }

    pub fn revert_to(&mut self, migrations_dir: impl AsRef<Path>, target_version: i64) -> Result<i64> {
        let set = MigrationSet::load(migrations_dir.as_ref())?;
        let version = MigrationRunner { conn: &self.conn }.revert_to(&set, target_version)?;
        self.schema = crate::schema::load_schema(&self.conn)?;
        Ok(version)
    }

    pub fn apply_schema(&mut self, schema_sql_path: impl AsRef<Path>) -> Result<()> {
        MigrationRunner { conn: &self.conn }.apply_schema_file(schema_sql_path.as_ref())?;
        self.schema = crate::schema::load_schema(&self.conn)?;
        Ok(())
    }

    pub fn current_migration_version(&self) -> Result<i64> {
        MigrationRunner { conn: &self.conn }.current_version()
    }

    // -- query passthrough -------------------------------------------------

    pub fn query_string(&self, sql: &str, params: &[&str]) -> Result<Vec<String>> {
        query::query_string(&self.conn, sql, params)
    }

    pub fn query_integer(&self, sql: &str, params: &[&str]) -> Result<Vec<i64>> {
        query::query_integer(&self.conn, sql, params)
    }

    pub fn query_float(&self, sql: &str, params: &[&str]) -> Result<Vec<f64>> {
        query::query_float(&self.conn, sql, params)
    }

    // -- transaction facade ------------------------------------------------

    pub fn begin_transaction(&self) -> Result<()> {
        self.tx.begin(&self.conn)
    }

    pub fn commit(&self) -> Result<()> {
        self.tx.commit(&self.conn)
    }

    pub fn rollback(&self) -> Result<()> {
        self.tx.rollback(&self.conn)
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_active()
    }

    /// One line per table, grouped by kind, mirroring the original
    /// `Database::describe()`.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut collections: Vec<&str> = self.schema.collection_names();
        collections.sort_unstable();
        for collection in collections {
            lines.push(format!("collection {collection}"));
            for table in self.list_vector_groups(collection) {
                lines.push(format!("  vector {table}"));
            }
            for table in self.list_set_groups(collection) {
                lines.push(format!("  set {table}"));
            }
            for table in self.list_time_series_groups(collection) {
                lines.push(format!("  time_series {table}"));
            }
            if let Ok(table_name) = self.schema.find_time_series_files_table(collection) {
                lines.push(format!("  time_series_files {table_name}"));
            }
        }
        lines
    }
}

fn init_engine_once() {
    ENGINE_INIT.call_once(|| {
        tracing::debug!("initializing embedded SQL engine (one-shot)");
    });
}
