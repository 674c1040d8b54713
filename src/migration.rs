//! Versioned schema migrations.
//!
//! Migration scripts are pairs of files named `NNNN_name.up.sql` /
//! `NNNN_name.down.sql` in a directory. The applied version is persisted in
//! a reserved `__quiver_metadata` key/value table rather than a SQLite-style
//! `PRAGMA user_version`, which DuckDB has no equivalent for.

use std::path::{Path, PathBuf};

use duckdb::Connection;
use tracing::instrument;

use crate::error::{Error, Result};

const METADATA_TABLE: &str = "__quiver_metadata";
const VERSION_KEY: &str = "schema_version";

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub name: String,
    pub up_sql: String,
    pub down_sql: String,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    pub migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Load every `NNNN_name.up.sql` / `NNNN_name.down.sql` pair from
    /// `dir`, sorted ascending by version.
    pub fn load(dir: &Path) -> Result<Self> {
        let pattern = dir.join("*.up.sql");
        let pattern_str = pattern
            .to_str()
            .ok_or_else(|| Error::invalid_argument("migrations path is not valid UTF-8"))?;

        let mut migrations = Vec::new();
        for entry in glob::glob(pattern_str).map_err(|e| Error::schema(e.to_string()))? {
            let up_path = entry.map_err(|e| Error::schema(e.to_string()))?;
            let file_name = up_path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::schema("migration file name is not valid UTF-8"))?;
            let stem = file_name.strip_suffix(".up.sql").expect("glob matched *.up.sql");
            let (version, name) = parse_migration_stem(stem)?;

            let down_path = dir.join(format!("{stem}.down.sql"));
            let up_sql = std::fs::read_to_string(&up_path).map_err(|e| Error::io(up_path.clone(), e))?;
            let down_sql = std::fs::read_to_string(&down_path).map_err(|e| Error::io(down_path.clone(), e))?;

            migrations.push(Migration {
                version,
                name,
                up_sql,
                down_sql,
            });
        }
        migrations.sort_by_key(|m| m.version);
        Ok(Self { migrations })
    }

    pub fn latest_version(&self) -> i64 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }
}

fn parse_migration_stem(stem: &str) -> Result<(i64, String)> {
    let (version_part, name_part) = stem
        .split_once('_')
        .ok_or_else(|| Error::schema(format!("migration file '{stem}' is not named NNNN_name")))?;
    let version: i64 = version_part
        .parse()
        .map_err(|_| Error::schema(format!("migration file '{stem}' has a non-numeric version prefix")))?;
    Ok((version, name_part.to_string()))
}

pub struct MigrationRunner<'a> {
    pub conn: &'a Connection,
}

impl<'a> MigrationRunner<'a> {
    pub fn ensure_metadata_table(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{METADATA_TABLE}\" (key TEXT PRIMARY KEY, value TEXT NOT NULL)"
        ))?;
        Ok(())
    }

    pub fn current_version(&self) -> Result<i64> {
        self.ensure_metadata_table()?;
        let value: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT value FROM \"{METADATA_TABLE}\" WHERE key = ?"),
                [VERSION_KEY],
                |row| row.get(0),
            )
            .ok();
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    fn set_version(&self, version: i64) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO \"{METADATA_TABLE}\" (key, value) VALUES (?, ?)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value"
            ),
            duckdb::params![VERSION_KEY, version.to_string()],
        )?;
        Ok(())
    }

    /// Apply every migration whose version is greater than the persisted
    /// version, in ascending order, each in its own transaction.
    #[instrument(skip(self, set))]
    pub fn migrate_up(&self, set: &MigrationSet) -> Result<i64> {
        let current = self.current_version()?;
        for migration in set.migrations.iter().filter(|m| m.version > current) {
            self.conn.execute_batch("BEGIN TRANSACTION").map_err(Error::from)?;
            let result = self
                .conn
                .execute_batch(&migration.up_sql)
                .map_err(|e| Error::Migration {
                    version: migration.version,
                    source: Box::new(Error::from(e)),
                })
                .and_then(|_| self.set_version(migration.version));
            match result {
                Ok(()) => {
                    self.conn.execute_batch("COMMIT")?;
                    tracing::info!(version = migration.version, name = %migration.name, "applied migration");
                }
                Err(err) => {
                    self.conn.execute_batch("ROLLBACK").ok();
                    return Err(err);
                }
            }
        }
        self.current_version()
    }

    /// Roll back every migration above `target_version`, in descending order.
    #[instrument(skip(self, set))]
    pub fn revert_to(&self, set: &MigrationSet, target_version: i64) -> Result<i64> {
        let current = self.current_version()?;
        let mut to_revert: Vec<&Migration> = set
            .migrations
            .iter()
            .filter(|m| m.version > target_version && m.version <= current)
            .collect();
        to_revert.sort_by_key(|m| std::cmp::Reverse(m.version));

        for (i, migration) in to_revert.iter().enumerate() {
            self.conn.execute_batch("BEGIN TRANSACTION").map_err(Error::from)?;
            let previous = to_revert
                .get(i + 1)
                .map(|m| m.version)
                .unwrap_or(target_version);
            let result = self
                .conn
                .execute_batch(&migration.down_sql)
                .map_err(|e| Error::Migration {
                    version: migration.version,
                    source: Box::new(Error::from(e)),
                })
                .and_then(|_| self.set_version(previous));
            match result {
                Ok(()) => {
                    self.conn.execute_batch("COMMIT")?;
                    tracing::info!(version = migration.version, name = %migration.name, "reverted migration");
                }
                Err(err) => {
                    self.conn.execute_batch("ROLLBACK").ok();
                    return Err(err);
                }
            }
        }
        self.current_version()
    }

    /// Apply a single bundled `schema.sql` file directly, for
    /// `Database::from_schema`, and record it as version 1 with no
    /// down-script.
    pub fn apply_schema_file(&self, path: &Path) -> Result<()> {
        let sql = std::fs::read_to_string(path).map_err(|e| Error::io(path.to_path_buf(), e))?;
        self.conn.execute_batch(&sql)?;
        self.ensure_metadata_table()?;
        self.set_version(1)
    }
}

pub fn default_migrations_dir(base: &Path) -> PathBuf {
    base.join("migrations")
}
