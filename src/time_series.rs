//! Time-series attribute groups and the time-series-files singleton table.
//!
//! A time-series group table carries one dimension column (named `date_*`
//! or typed `DATE_TIME`) plus one or more value columns, all sharing the
//! owning element's `id`. Rows are read back ordered by the dimension.
//!
//! A time-series-files table is a singleton row per *collection* (no `id`
//! column at all) whose columns are all `TEXT` file paths to externally
//! stored series data.

use ahash::AHashMap;
use duckdb::{params_from_iter, Connection};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::schema::{dimension_column, Schema};
use crate::transaction::{TransactionGuard, TransactionState};
use crate::value::Value;

pub struct TimeSeriesWriter<'a> {
    pub conn: &'a Connection,
    pub schema: &'a Schema,
    pub tx: &'a TransactionState,
}

impl<'a> TimeSeriesWriter<'a> {
    /// Replace the full time series of `attribute` for element `id` with
    /// `(dimension, value)` pairs. Existing rows for `id` are deleted first.
    #[instrument(skip(self, series), fields(collection = %collection, id))]
    pub fn update_time_series(
        &self,
        collection: &str,
        id: i64,
        attribute: &str,
        series: &[(String, Value)],
    ) -> Result<()> {
        let table_name = self.schema.find_time_series_table(collection, attribute)?;
        let table = self
            .schema
            .get_table(&table_name)
            .ok_or_else(|| Error::not_found(format!("table '{table_name}' not found")))?;
        let dimension = dimension_column(table)
            .ok_or_else(|| Error::schema(format!("'{table_name}' has no dimension column")))?;

        let guard = TransactionGuard::begin(self.conn, self.tx)?;
        guard
            .conn()
            .execute(&format!("DELETE FROM \"{table_name}\" WHERE id = ?"), [id])?;

        for (dim_value, value) in series {
            let canonical = Value::canonical_datetime(dim_value)?;
            guard.conn().execute(
                &format!(
                    "INSERT INTO \"{table_name}\" (id, \"{dimension}\", \"{attribute}\") VALUES (?, ?, ?)"
                ),
                duckdb::params![id, canonical, value],
            )?;
        }
        guard.commit()?;
        Ok(())
    }

    /// Replace the singleton row of `<collection>_time_series_files` in one
    /// transaction. Columns absent from `values` are written as `NULL`.
    #[instrument(skip(self, values), fields(collection = %collection))]
    pub fn update_time_series_files(&self, collection: &str, values: &AHashMap<String, Option<String>>) -> Result<()> {
        let table_name = self.schema.find_time_series_files_table(collection)?;
        let table = self
            .schema
            .get_table(&table_name)
            .ok_or_else(|| Error::not_found(format!("table '{table_name}' not found")))?;

        let guard = TransactionGuard::begin(self.conn, self.tx)?;
        guard.conn().execute(&format!("DELETE FROM \"{table_name}\""), [])?;

        let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let column_list = columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let bound: Vec<Option<String>> = columns
            .iter()
            .map(|c| values.get(*c).cloned().unwrap_or(None))
            .collect();
        guard.conn().execute(
            &format!("INSERT INTO \"{table_name}\" ({column_list}) VALUES ({placeholders})"),
            params_from_iter(bound.iter()),
        )?;
        guard.commit()?;
        Ok(())
    }
}

pub struct TimeSeriesReader<'a> {
    pub conn: &'a Connection,
    pub schema: &'a Schema,
}

impl<'a> TimeSeriesReader<'a> {
    pub fn read_time_series(&self, collection: &str, id: i64, attribute: &str) -> Result<Vec<(String, Value)>> {
        let table_name = self.schema.find_time_series_table(collection, attribute)?;
        let table = self
            .schema
            .get_table(&table_name)
            .ok_or_else(|| Error::not_found(format!("table '{table_name}' not found")))?;
        let dimension = dimension_column(table)
            .ok_or_else(|| Error::schema(format!("'{table_name}' has no dimension column")))?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT \"{dimension}\", \"{attribute}\" FROM \"{table_name}\" WHERE id = ? ORDER BY \"{dimension}\" ASC"
        ))?;
        let rows = stmt.query_map([id], |row| {
            let dim: String = row.get(0)?;
            let value: duckdb::types::Value = row.get(1)?;
            Ok((dim, Value::from(value)))
        })?;

        let mut series = Vec::new();
        for row in rows {
            series.push(row?);
        }
        Ok(series)
    }

    /// Whether `collection` has a `<collection>_time_series_files` table.
    pub fn has_time_series_files(&self, collection: &str) -> bool {
        self.schema.find_time_series_files_table(collection).is_ok()
    }

    pub fn list_time_series_files_columns(&self, collection: &str) -> Result<Vec<String>> {
        let table_name = self.schema.find_time_series_files_table(collection)?;
        let table = self
            .schema
            .get_table(&table_name)
            .ok_or_else(|| Error::not_found(format!("table '{table_name}' not found")))?;
        Ok(table.columns.iter().map(|c| c.name.clone()).collect())
    }

    /// Every column of the singleton `<collection>_time_series_files` row,
    /// `None` when the column's value is null or when there is no row yet.
    pub fn read_time_series_files(&self, collection: &str) -> Result<AHashMap<String, Option<String>>> {
        let table_name = self.schema.find_time_series_files_table(collection)?;
        let table = self
            .schema
            .get_table(&table_name)
            .ok_or_else(|| Error::not_found(format!("table '{table_name}' not found")))?;
        let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let mut result: AHashMap<String, Option<String>> =
            columns.iter().map(|c| (c.to_string(), None)).collect();

        let column_list = columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT {column_list} FROM \"{table_name}\" LIMIT 1");
        let outcome = self.conn.query_row(&sql, [], |row| {
            for (i, name) in columns.iter().enumerate() {
                let value: Option<String> = row.get(i)?;
                result.insert((*name).to_string(), value);
            }
            Ok(())
        });
        match outcome {
            Ok(()) => {}
            Err(duckdb::Error::QueryReturnedNoRows) => {}
            Err(e) => return Err(Error::from(e)),
        }
        Ok(result)
    }
}
