//! Scalar/vector/set reads and catalog-facing metadata introspection.
//!
//! Time-series reads live in [`crate::time_series`] since they carry their
//! own dimension-column handling; this module covers the scalar and
//! fixed-shape group kinds plus the metadata listing calls the CLI's
//! `describe` subcommand uses.

use duckdb::Connection;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::schema::{ColumnDefinition, Schema};
use crate::value::Value;

pub struct ElementReader<'a> {
    pub conn: &'a Connection,
    pub schema: &'a Schema,
}

impl<'a> ElementReader<'a> {
    /// Every scalar attribute of one row, in declaration order.
    pub fn read_element(&self, collection: &str, id: i64) -> Result<Element> {
        let table = self
            .schema
            .get_table(collection)
            .ok_or_else(|| Error::not_found(format!("collection '{collection}' not found")))?;
        let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let column_list = columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT {column_list} FROM \"{collection}\" WHERE id = ?");

        let mut element = Element::new();
        let found = self
            .conn
            .query_row(&sql, [id], |row| {
                for (i, name) in columns.iter().enumerate() {
                    if *name == "id" {
                        continue;
                    }
                    let value: duckdb::types::Value = row.get(i)?;
                    element.set_scalar(*name, Value::from(value));
                }
                Ok(())
            })
            .is_ok();
        if !found {
            return Err(Error::not_found(format!("no element with id {id} in '{collection}'")));
        }
        Ok(element)
    }

    /// `attribute`'s value for one row: absent either when the row does not
    /// exist or when the value itself is null — the two are indistinguishable.
    pub fn read_scalar_by_id(&self, collection: &str, id: i64, attribute: &str) -> Result<Option<Value>> {
        if !self.schema.has_table(collection) {
            return Err(Error::not_found(format!("collection '{collection}' not found")));
        }
        let outcome = self.conn.query_row(
            &format!("SELECT \"{attribute}\" FROM \"{collection}\" WHERE id = ?"),
            [id],
            |row| row.get::<_, duckdb::types::Value>(0),
        );
        match outcome {
            Ok(value) => Ok(match Value::from(value) {
                Value::Null => None,
                other => Some(other),
            }),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::from(e)),
        }
    }

    /// `attribute`'s non-null values across every row of `collection`,
    /// ordered by `id`.
    pub fn read_scalar(&self, collection: &str, attribute: &str) -> Result<Vec<Value>> {
        if !self.schema.has_table(collection) {
            return Err(Error::not_found(format!("collection '{collection}' not found")));
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT \"{attribute}\" FROM \"{collection}\" WHERE \"{attribute}\" IS NOT NULL ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, duckdb::types::Value>(0))?;
        let mut values = Vec::new();
        for row in rows {
            values.push(Value::from(row?));
        }
        Ok(values)
    }

    pub fn read_vector_by_id(&self, collection: &str, id: i64, attribute: &str) -> Result<Vec<Value>> {
        let table_name = self.schema.find_vector_table(collection, attribute)?;
        self.read_ordered_array(&table_name, id, attribute, "vector_index")
    }

    /// `attribute`'s arrays across every row of the vector table, grouped by
    /// `id` and ordered by `vector_index` within each group. The outer
    /// sequence only covers ids actually present in the vector table.
    pub fn read_vector(&self, collection: &str, attribute: &str) -> Result<Vec<Vec<Value>>> {
        let table_name = self.schema.find_vector_table(collection, attribute)?;
        self.read_grouped_array(&table_name, attribute, "ORDER BY id ASC, vector_index ASC")
    }

    pub fn read_set_by_id(&self, collection: &str, id: i64, attribute: &str) -> Result<Vec<Value>> {
        let table_name = self.schema.find_set_table(collection, attribute)?;
        self.read_unordered_array(&table_name, id, attribute)
    }

    /// Same shape as [`Self::read_vector`], but without a `vector_index`
    /// order — inner order is whatever the table scan yields.
    pub fn read_set(&self, collection: &str, attribute: &str) -> Result<Vec<Vec<Value>>> {
        let table_name = self.schema.find_set_table(collection, attribute)?;
        self.read_grouped_array(&table_name, attribute, "ORDER BY id ASC")
    }

    fn read_ordered_array(&self, table: &str, id: i64, attribute: &str, order_column: &str) -> Result<Vec<Value>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT \"{attribute}\" FROM \"{table}\" WHERE id = ? ORDER BY \"{order_column}\" ASC"
        ))?;
        let rows = stmt.query_map([id], |row| row.get::<_, duckdb::types::Value>(0))?;
        let mut values = Vec::new();
        for row in rows {
            values.push(Value::from(row?));
        }
        Ok(values)
    }

    fn read_unordered_array(&self, table: &str, id: i64, attribute: &str) -> Result<Vec<Value>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT \"{attribute}\" FROM \"{table}\" WHERE id = ?"))?;
        let rows = stmt.query_map([id], |row| row.get::<_, duckdb::types::Value>(0))?;
        let mut values = Vec::new();
        for row in rows {
            values.push(Value::from(row?));
        }
        Ok(values)
    }

    /// Group rows of `table` by `id` (a new group starts whenever `id`
    /// changes, so the rows must already be ordered by `id`); null values
    /// are dropped rather than pushed as an empty slot.
    fn read_grouped_array(&self, table: &str, attribute: &str, order_clause: &str) -> Result<Vec<Vec<Value>>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id, \"{attribute}\" FROM \"{table}\" {order_clause}"))?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let value: duckdb::types::Value = row.get(1)?;
            Ok((id, Value::from(value)))
        })?;

        let mut groups: Vec<Vec<Value>> = Vec::new();
        let mut current_id: Option<i64> = None;
        for row in rows {
            let (id, value) = row?;
            if current_id != Some(id) {
                groups.push(Vec::new());
                current_id = Some(id);
            }
            if !value.is_null() {
                groups.last_mut().expect("group just pushed").push(value);
            }
        }
        Ok(groups)
    }

    /// All ids in a collection, ordered by `id` (the DuckDB-era replacement
    /// for a `rowid`-ordered scan).
    pub fn read_element_ids(&self, collection: &str) -> Result<Vec<i64>> {
        if !self.schema.has_table(collection) {
            return Err(Error::not_found(format!("collection '{collection}' not found")));
        }
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id FROM \"{collection}\" ORDER BY id ASC"))?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        rows.map(|r| r.map_err(Error::from)).collect()
    }

    pub fn label_to_id(&self, collection: &str, label: &str) -> Result<i64> {
        self.conn
            .query_row(
                &format!("SELECT id FROM \"{collection}\" WHERE label = ?"),
                [label],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|_| Error::not_found(format!("label '{label}' not found in '{collection}'")))
    }

    pub fn id_to_label(&self, collection: &str, id: i64) -> Result<String> {
        self.conn
            .query_row(
                &format!("SELECT label FROM \"{collection}\" WHERE id = ?"),
                [id],
                |row| row.get::<_, String>(0),
            )
            .map_err(|_| Error::not_found(format!("no element with id {id} in '{collection}'")))
    }

    /// Non-structural attribute columns of a collection, for `describe`.
    pub fn list_scalar_attributes(&self, collection: &str) -> Result<Vec<ColumnDefinition>> {
        let table = self
            .schema
            .get_table(collection)
            .ok_or_else(|| Error::not_found(format!("collection '{collection}' not found")))?;
        Ok(table.attribute_columns().cloned().collect())
    }

    pub fn list_vector_groups(&self, collection: &str) -> Vec<String> {
        self.list_group_tables(collection, |s, n| s.is_vector_table(n))
    }

    pub fn list_set_groups(&self, collection: &str) -> Vec<String> {
        self.list_group_tables(collection, |s, n| s.is_set_table(n))
    }

    pub fn list_time_series_groups(&self, collection: &str) -> Vec<String> {
        self.list_group_tables(collection, |s, n| s.is_time_series_table(n))
    }

    fn list_group_tables(&self, collection: &str, predicate: impl Fn(&Schema, &str) -> bool) -> Vec<String> {
        let prefix = format!("{collection}_");
        let mut names: Vec<String> = self
            .schema
            .table_names()
            .filter(|name| name.starts_with(&prefix) && predicate(self.schema, name))
            .map(|s| s.to_string())
            .collect();
        names.sort();
        names
    }
}
