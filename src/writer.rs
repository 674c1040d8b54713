//! Element writer: create / update / delete, FK label pre-resolution, and
//! array-attribute routing to the correct vector/set/time-series table.

use ahash::AHashMap;
use duckdb::{params_from_iter, Connection};
use tracing::instrument;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::schema::{dimension_column, Schema, TableDefinition};
use crate::transaction::{TransactionGuard, TransactionState};
use crate::validator::TypeValidator;
use crate::value::Value;

/// Resolve every `Text` value sitting in a foreign-key column to its integer
/// id, by looking the label up in the FK's target table. This pass never
/// touches the database beyond read-only `SELECT`s and never mutates it.
pub fn resolve_fk_labels(conn: &Connection, schema: &Schema, collection: &str, element: &Element) -> Result<Element> {
    let mut resolved = element.clone();
    let collection_table = schema
        .get_table(collection)
        .ok_or_else(|| Error::not_found(format!("collection '{collection}' not found")))?;

    for (name, value) in element.scalars() {
        if let Some(resolved_value) = resolve_one(conn, collection_table, name, value)? {
            resolved.replace_scalar(name, resolved_value);
        }
    }

    for (name, values) in element.arrays() {
        let Some(table) = find_backing_table_for_attribute(schema, collection, name) else {
            continue;
        };
        for (i, value) in values.iter().enumerate() {
            if let Some(resolved_value) = resolve_one(conn, table, name, value)? {
                resolved.replace_array_value(name, i, resolved_value);
            }
        }
    }

    Ok(resolved)
}

fn resolve_one(conn: &Connection, table: &TableDefinition, column: &str, value: &Value) -> Result<Option<Value>> {
    let Value::Text(label) = value else {
        return Ok(None);
    };
    let Some(fk) = table.foreign_key_on(column) else {
        return Ok(None);
    };
    let id = lookup_label(conn, &fk.to_table, label)?;
    Ok(Some(Value::Integer(id)))
}

fn lookup_label(conn: &Connection, target_table: &str, label: &str) -> Result<i64> {
    conn.query_row(
        &format!("SELECT id FROM \"{target_table}\" WHERE label = ?"),
        [label],
        |row| row.get::<_, i64>(0),
    )
    .map_err(|_| {
        Error::not_found(format!("label '{label}' not found in '{target_table}'"))
    })
}

fn find_backing_table_for_attribute<'a>(schema: &'a Schema, collection: &str, attribute: &str) -> Option<&'a TableDefinition> {
    for name in [
        schema.find_vector_table(collection, attribute).ok(),
        schema.find_set_table(collection, attribute).ok(),
        schema.find_time_series_table(collection, attribute).ok(),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(table) = schema.get_table(&name) {
            return Some(table);
        }
    }
    None
}

/// Groups of array attributes keyed by the table they share.
fn group_arrays_by_table<'e>(
    schema: &Schema,
    collection: &str,
    element: &'e Element,
) -> Result<AHashMap<String, Vec<(&'e str, &'e [Value])>>> {
    let mut groups: AHashMap<String, Vec<(&str, &[Value])>> = AHashMap::new();
    for (name, values) in element.arrays() {
        let table_name = schema
            .find_vector_table(collection, name)
            .or_else(|_| schema.find_set_table(collection, name))
            .or_else(|_| schema.find_time_series_table(collection, name))
            .map_err(|_| {
                Error::create_element(
                    collection,
                    format!("no vector/set/time-series table carries attribute '{name}'"),
                )
            })?;
        groups.entry(table_name).or_default().push((name, values));
    }
    Ok(groups)
}

pub struct ElementWriter<'a> {
    pub conn: &'a Connection,
    pub schema: &'a Schema,
    pub types: TypeValidator<'a>,
    pub tx: &'a TransactionState,
}

impl<'a> ElementWriter<'a> {
    #[instrument(skip(self, element), fields(collection = %collection))]
    pub fn create_element(&self, collection: &str, element: &Element) -> Result<i64> {
        let table = self
            .schema
            .get_table(collection)
            .ok_or_else(|| Error::not_found(format!("collection '{collection}' not found")))?;
        if !self.schema.is_collection(collection) {
            return Err(Error::invalid_argument(format!("'{collection}' is not a collection")));
        }
        let scalar_count = element.scalars().count();
        if scalar_count == 0 {
            return Err(Error::invalid_argument("element has no scalar attributes"));
        }

        let resolved = resolve_fk_labels(self.conn, self.schema, collection, element)?;
        for (name, value) in resolved.scalars() {
            self.types.validate_scalar(collection, name, value)?;
        }

        let guard = TransactionGuard::begin(self.conn, self.tx)?;
        let id = self.insert_scalars(guard.conn(), table, &resolved)?;
        self.insert_arrays(guard.conn(), collection, id, &resolved)?;
        guard.commit()?;

        tracing::debug!(collection, id, "created element");
        Ok(id)
    }

    #[instrument(skip(self, element), fields(collection = %collection, id))]
    pub fn update_element(&self, collection: &str, id: i64, element: &Element) -> Result<()> {
        let table = self
            .schema
            .get_table(collection)
            .ok_or_else(|| Error::not_found(format!("collection '{collection}' not found")))?;
        if element.is_empty() {
            return Err(Error::invalid_argument("element has no attributes to update"));
        }

        let resolved = resolve_fk_labels(self.conn, self.schema, collection, element)?;
        for (name, value) in resolved.scalars() {
            self.types.validate_scalar(collection, name, value)?;
        }

        let guard = TransactionGuard::begin(self.conn, self.tx)?;

        if resolved.scalars().count() > 0 {
            self.update_scalars(guard.conn(), table, id, &resolved)?;
        }

        let groups = group_arrays_by_table(self.schema, collection, &resolved)?;
        for (table_name, columns) in &groups {
            let group_table = self.schema.get_table(table_name).expect("table just resolved from schema");
            for (name, values) in columns {
                self.types.validate_array(table_name, name, values)?;
            }
            self.replace_group_rows(guard.conn(), group_table, id, columns)?;
        }

        guard.commit()?;
        tracing::debug!(collection, id, "updated element");
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %collection, id))]
    pub fn delete_element_by_id(&self, collection: &str, id: i64) -> Result<()> {
        if !self.schema.has_table(collection) {
            return Err(Error::not_found(format!("collection '{collection}' not found")));
        }
        let guard = TransactionGuard::begin(self.conn, self.tx)?;
        guard
            .conn()
            .execute(&format!("DELETE FROM \"{collection}\" WHERE id = ?"), [id])?;
        guard.commit()?;
        tracing::debug!(collection, id, "deleted element (cascades handled by schema FKs)");
        Ok(())
    }

    /// `update_scalar_relation`: resolve `to_label` in the FK's target table
    /// and repoint the row whose own `label = from_label`.
    pub fn update_scalar_relation(
        &self,
        collection: &str,
        attribute: &str,
        from_label: &str,
        to_label: &str,
    ) -> Result<()> {
        let table = self
            .schema
            .get_table(collection)
            .ok_or_else(|| Error::not_found(format!("collection '{collection}' not found")))?;
        let fk = table
            .foreign_key_on(attribute)
            .ok_or_else(|| Error::not_found(format!("'{attribute}' is not a foreign key on '{collection}'")))?;
        let target_id = lookup_label(self.conn, &fk.to_table, to_label)?;

        let guard = TransactionGuard::begin(self.conn, self.tx)?;
        let changed = guard.conn().execute(
            &format!("UPDATE \"{collection}\" SET \"{attribute}\" = ? WHERE label = ?"),
            duckdb::params![target_id, from_label],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("label '{from_label}' not found in '{collection}'")));
        }
        guard.commit()?;
        Ok(())
    }

    fn insert_scalars(&self, conn: &Connection, table: &TableDefinition, element: &Element) -> Result<i64> {
        let columns: Vec<&str> = element.scalars().map(|(name, _)| name).collect();
        let values: Vec<&Value> = element.scalars().map(|(_, value)| value).collect();

        let column_list = columns
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO \"{}\" ({column_list}) VALUES ({placeholders}) RETURNING id",
            table.name
        );

        conn.query_row(&sql, params_from_iter(values.iter().map(|v| *v)), |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| Error::create_element(table.name.as_str(), e.to_string()))
    }

    fn update_scalars(&self, conn: &Connection, table: &TableDefinition, id: i64, element: &Element) -> Result<()> {
        let assignments: Vec<String> = element
            .scalars()
            .map(|(name, _)| format!("\"{name}\" = ?"))
            .collect();
        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE id = ?",
            table.name,
            assignments.join(", ")
        );
        let mut bound: Vec<Value> = element.scalars().map(|(_, v)| v.clone()).collect();
        bound.push(Value::Integer(id));
        conn.execute(&sql, params_from_iter(bound.iter()))?;
        Ok(())
    }

    fn insert_arrays(&self, conn: &Connection, collection: &str, id: i64, element: &Element) -> Result<()> {
        let groups = group_arrays_by_table(self.schema, collection, element)?;
        for (table_name, columns) in &groups {
            let table = self.schema.get_table(table_name).expect("table just resolved from schema");
            for (name, values) in columns {
                self.types.validate_array(table_name, name, values)?;
            }
            self.insert_group_rows(conn, table, id, columns)?;
        }
        Ok(())
    }

    /// Zip every array targeting the same group table row-wise; all arrays
    /// must share one length or the write fails deterministically before
    /// any row is inserted.
    fn insert_group_rows(
        &self,
        conn: &Connection,
        table: &TableDefinition,
        id: i64,
        columns: &[(&str, &[Value])],
    ) -> Result<()> {
        if columns.is_empty() {
            return Ok(());
        }
        let n = columns[0].1.len();
        if columns.iter().any(|(_, values)| values.len() != n) {
            return Err(Error::create_element(
                table.name.as_str(),
                "arrays sharing a group table must have equal length",
            ));
        }

        let is_vector = table.has_column("vector_index");
        let dimension = dimension_column(table);

        for row in 0..n {
            let mut col_names = vec!["id".to_string()];
            let mut values: Vec<Value> = vec![Value::Integer(id)];

            if is_vector {
                col_names.push("vector_index".to_string());
                values.push(Value::Integer(row as i64 + 1));
            }

            for (name, column_values) in columns {
                if let Some(dim) = &dimension {
                    if dim == name {
                        continue; // written explicitly below in declared position
                    }
                }
                col_names.push((*name).to_string());
                values.push(resolve_set_value(conn, table, name, &column_values[row])?);
            }

            if let Some(dim) = &dimension {
                if let Some((_, dim_values)) = columns.iter().find(|(n, _)| n == dim) {
                    col_names.push(dim.clone());
                    values.push(dim_values[row].clone());
                }
            }

            let column_list = col_names
                .iter()
                .map(|c| format!("\"{c}\""))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = vec!["?"; col_names.len()].join(", ");
            let sql = format!(
                "INSERT INTO \"{}\" ({column_list}) VALUES ({placeholders})",
                table.name
            );
            conn.execute(&sql, params_from_iter(values.iter()))?;
        }
        Ok(())
    }

    fn replace_group_rows(
        &self,
        conn: &Connection,
        table: &TableDefinition,
        id: i64,
        columns: &[(&str, &[Value])],
    ) -> Result<()> {
        conn.execute(&format!("DELETE FROM \"{}\" WHERE id = ?", table.name), [id])?;
        self.insert_group_rows(conn, table, id, columns)
    }
}

/// Within a set table, a `Text` value on a FK column triggers a label-lookup
/// safety net on insert (redundant with the shared pre-resolution pass, but
/// preserved for call sites that build raw set values directly).
fn resolve_set_value(conn: &Connection, table: &TableDefinition, column: &str, value: &Value) -> Result<Value> {
    if let Some(resolved) = resolve_one(conn, table, column, value)? {
        Ok(resolved)
    } else {
        Ok(value.clone())
    }
}

