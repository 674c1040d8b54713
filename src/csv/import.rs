//! CSV importer: two-phase validate-then-mutate import for scalar
//! collections and group tables.

use std::path::Path;

use ahash::AHashMap;
use duckdb::Connection;
use tracing::instrument;

use super::options::CsvOptions;
use crate::error::{Error, Result};
use crate::schema::{DataType, Schema, TableDefinition};
use crate::transaction::{TransactionGuard, TransactionState};
use crate::value::Value;

struct Document {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[instrument(skip(conn, schema, tx), fields(collection = %collection))]
pub fn import_csv(
    conn: &Connection,
    schema: &Schema,
    tx: &TransactionState,
    collection: &str,
    group: Option<&str>,
    source: &Path,
    options: &CsvOptions,
) -> Result<()> {
    let raw = std::fs::read(source).map_err(|e| Error::io(source.to_path_buf(), e))?;
    let doc = parse_document(&raw)?;

    match group {
        None => import_scalar(conn, schema, tx, collection, &doc, options),
        Some(group) => import_group(conn, schema, tx, collection, group, &doc, options),
    }
}

/// Strip an optional `sep=<c>` first line, autodetect `;`-only files, and
/// trim Excel's trailing-comma artifact consistently across every row.
fn parse_document(raw: &[u8]) -> Result<Document> {
    let text = String::from_utf8_lossy(raw);
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return Err(Error::csv("CSV file is empty"));
    }

    let mut delimiter = b',';
    if let Some(first) = lines.first() {
        if let Some(rest) = first.strip_prefix("sep=") {
            if let Some(c) = rest.chars().next() {
                delimiter = c as u8;
            }
            lines.remove(0);
        }
    }
    if delimiter == b',' && !lines.is_empty() && lines[0].contains(';') && !lines[0].contains(',') {
        delimiter = b';';
    }
    if lines.is_empty() {
        return Err(Error::csv("CSV file has no header line"));
    }

    let joined = lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(joined.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| Error::csv(e.to_string()))?;
        records.push(record.iter().map(|f| f.to_string()).collect());
    }
    if records.is_empty() {
        return Err(Error::csv("CSV file has no header line"));
    }

    let mut header = records.remove(0);
    let trailing = header.iter().rev().take_while(|c| c.is_empty()).count();
    if trailing > 0 {
        header.truncate(header.len() - trailing);
        for row in &mut records {
            let n = row.len().saturating_sub(trailing);
            row.truncate(n);
        }
    }

    for row in &records {
        if row.len() != header.len() {
            return Err(Error::csv(format!(
                "row has {} fields, expected {}",
                row.len(),
                header.len()
            )));
        }
    }

    Ok(Document {
        headers: header,
        rows: records,
    })
}

fn label_map(conn: &Connection, table: &str) -> Result<AHashMap<String, i64>> {
    let mut stmt = conn.prepare(&format!("SELECT label, id FROM \"{table}\""))?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    let mut map = AHashMap::new();
    for row in rows {
        let (label, id) = row?;
        map.insert(label, id);
    }
    Ok(map)
}

/// A resolved cell, ready to bind: either a concrete value, or a deferred
/// self-referencing FK marked by `None` and recorded separately for the
/// post-insert UPDATE sub-pass.
enum Cell {
    Value(Value),
    DeferredSelfFk(String),
}

fn resolve_cell(
    column_name: &str,
    raw: &str,
    table: &TableDefinition,
    own_table_name: &str,
    labels: &AHashMap<String, AHashMap<String, i64>>,
    options: &CsvOptions,
) -> Result<Cell> {
    let column = table
        .column(column_name)
        .ok_or_else(|| Error::schema(format!("unknown column '{column_name}'")))?;

    if raw.is_empty() {
        if column.not_null {
            return Err(Error::csv(format!("'{column_name}' is NOT NULL but the cell is empty")));
        }
        return Ok(Cell::Value(Value::Null));
    }

    if let Some(fk) = table.foreign_key_on(column_name) {
        if fk.to_table == own_table_name {
            return Ok(Cell::DeferredSelfFk(raw.to_string()));
        }
        let target_labels = labels
            .get(&fk.to_table)
            .ok_or_else(|| Error::schema(format!("no label map loaded for '{}'", fk.to_table)))?;
        let id = target_labels
            .get(raw)
            .ok_or_else(|| Error::not_found(format!("label '{raw}' not found in '{}'", fk.to_table)))?;
        return Ok(Cell::Value(Value::Integer(*id)));
    }

    match column.data_type {
        DataType::DateTime => {
            let canonical = if options.date_time_format.is_empty() {
                Value::canonical_datetime(raw)?
            } else {
                chrono::NaiveDateTime::parse_from_str(raw, &options.date_time_format)
                    .map_err(|_| Error::csv(format!("'{raw}' does not match the configured datetime format")))?
                    .format("%Y-%m-%dT%H:%M:%S")
                    .to_string()
            };
            Ok(Cell::Value(Value::Text(canonical)))
        }
        DataType::Integer => {
            if let Ok(i) = raw.parse::<i64>() {
                Ok(Cell::Value(Value::Integer(i)))
            } else if options.has_enum(column_name) {
                let value = options
                    .value_for(column_name, raw)
                    .ok_or_else(|| Error::csv(format!("'{raw}' is not a known enum label for '{column_name}'")))?;
                Ok(Cell::Value(Value::Integer(value)))
            } else {
                Err(Error::csv(format!("'{raw}' is not a valid integer for '{column_name}'")))
            }
        }
        DataType::Real => raw
            .parse::<f64>()
            .map(|v| Cell::Value(Value::Real(v)))
            .map_err(|_| Error::csv(format!("'{raw}' is not a valid number for '{column_name}'"))),
        DataType::Text => Ok(Cell::Value(Value::Text(raw.to_string()))),
    }
}

fn import_scalar(
    conn: &Connection,
    schema: &Schema,
    tx: &TransactionState,
    collection: &str,
    doc: &Document,
    options: &CsvOptions,
) -> Result<()> {
    let table = schema
        .get_table(collection)
        .ok_or_else(|| Error::not_found(format!("collection '{collection}' not found")))?;

    if !doc.headers.iter().any(|h| h == "label") {
        return Err(Error::csv("scalar import requires a 'label' column"));
    }
    let expected: Vec<&str> = table
        .columns
        .iter()
        .filter(|c| c.name != "id")
        .map(|c| c.name.as_str())
        .collect();
    check_column_set(&doc.headers, &expected)?;

    let mut labels: AHashMap<String, AHashMap<String, i64>> = AHashMap::new();
    for fk in &table.foreign_keys {
        if fk.to_table != collection && !labels.contains_key(&fk.to_table) {
            labels.insert(fk.to_table.clone(), label_map(conn, &fk.to_table)?);
        }
    }

    if doc.rows.is_empty() {
        let guard = TransactionGuard::begin(conn, tx)?;
        guard.conn().execute(&format!("DELETE FROM \"{collection}\"", ), [])?;
        guard.commit()?;
        return Ok(());
    }

    struct ResolvedRow {
        values: Vec<(String, Value)>,
        deferred: Vec<(String, String)>,
    }

    let mut resolved_rows = Vec::with_capacity(doc.rows.len());
    for row in &doc.rows {
        let mut values = Vec::with_capacity(doc.headers.len());
        let mut deferred = Vec::new();
        for (header, raw) in doc.headers.iter().zip(row.iter()) {
            match resolve_cell(header, raw, table, collection, &labels, options)? {
                Cell::Value(v) => values.push((header.clone(), v)),
                Cell::DeferredSelfFk(label) => {
                    values.push((header.clone(), Value::Null));
                    deferred.push((header.clone(), label));
                }
            }
        }
        resolved_rows.push(ResolvedRow { values, deferred });
    }

    let guard = TransactionGuard::begin(conn, tx)?;
    guard.conn().execute(&format!("DELETE FROM \"{collection}\""), [])?;

    let mut inserted_ids = Vec::with_capacity(resolved_rows.len());
    for row in &resolved_rows {
        let columns: Vec<&str> = row.values.iter().map(|(name, _)| name.as_str()).collect();
        let values: Vec<&Value> = row.values.iter().map(|(_, v)| v).collect();
        let column_list = columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!("INSERT INTO \"{collection}\" ({column_list}) VALUES ({placeholders}) RETURNING id");
        let id = guard
            .conn()
            .query_row(&sql, duckdb::params_from_iter(values.iter().map(|v| *v)), |r| r.get::<_, i64>(0))
            .map_err(map_insert_error)?;
        inserted_ids.push(id);
    }

    let own_labels = label_map(guard.conn(), collection)?;
    for (row, &id) in resolved_rows.iter().zip(inserted_ids.iter()) {
        for (column, label) in &row.deferred {
            let target_id = own_labels
                .get(label)
                .ok_or_else(|| Error::not_found(format!("label '{label}' not found in '{collection}'")))?;
            guard.conn().execute(
                &format!("UPDATE \"{collection}\" SET \"{column}\" = ? WHERE id = ?"),
                duckdb::params![target_id, id],
            )?;
        }
    }

    guard.commit()?;
    Ok(())
}

fn import_group(
    conn: &Connection,
    schema: &Schema,
    tx: &TransactionState,
    collection: &str,
    group: &str,
    doc: &Document,
    options: &CsvOptions,
) -> Result<()> {
    let table_name = schema
        .find_vector_table(collection, group)
        .or_else(|_| schema.find_set_table(collection, group))
        .or_else(|_| schema.find_time_series_table(collection, group))
        .map_err(|_| Error::not_found(format!("no group table for '{collection}.{group}'")))?;
    let table = schema
        .get_table(&table_name)
        .ok_or_else(|| Error::not_found(format!("table '{table_name}' not found")))?;

    let expected: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    check_column_set(&doc.headers, &expected)?;

    let own_labels = label_map(conn, collection)?;
    let mut labels: AHashMap<String, AHashMap<String, i64>> = AHashMap::new();
    for fk in &table.foreign_keys {
        if fk.from_column != "id" && !labels.contains_key(&fk.to_table) {
            labels.insert(fk.to_table.clone(), label_map(conn, &fk.to_table)?);
        }
    }

    if doc.rows.is_empty() {
        let guard = TransactionGuard::begin(conn, tx)?;
        guard.conn().execute(&format!("DELETE FROM \"{table_name}\""), [])?;
        guard.commit()?;
        return Ok(());
    }

    let is_vector = table.has_column("vector_index");
    let mut resolved_rows: Vec<Vec<(String, Value)>> = Vec::with_capacity(doc.rows.len());
    let mut vector_counts: AHashMap<i64, i64> = AHashMap::new();

    for row in &doc.rows {
        let mut values = Vec::with_capacity(doc.headers.len());
        let mut owner_id: Option<i64> = None;
        for (header, raw) in doc.headers.iter().zip(row.iter()) {
            if header == "id" {
                let id = *own_labels
                    .get(raw)
                    .ok_or_else(|| Error::not_found(format!("label '{raw}' not found in '{collection}'")))?;
                owner_id = Some(id);
                values.push((header.clone(), Value::Integer(id)));
                continue;
            }
            if header == "vector_index" {
                let idx: i64 = raw
                    .parse()
                    .map_err(|_| Error::csv(format!("'{raw}' is not a valid vector_index")))?;
                values.push((header.clone(), Value::Integer(idx)));
                continue;
            }
            match resolve_cell(header, raw, table, collection, &labels, options)? {
                Cell::Value(v) => values.push((header.clone(), v)),
                Cell::DeferredSelfFk(label) => {
                    let id = *own_labels
                        .get(&label)
                        .ok_or_else(|| Error::not_found(format!("label '{label}' not found in '{collection}'")))?;
                    values.push((header.clone(), Value::Integer(id)));
                }
            }
        }
        if is_vector {
            if let (Some(owner), Some((_, Value::Integer(idx)))) =
                (owner_id, values.iter().find(|(n, _)| n == "vector_index"))
            {
                let counter = vector_counts.entry(owner).or_insert(0);
                *counter += 1;
                if *idx != *counter {
                    return Err(Error::csv(format!(
                        "vector_index for id {owner} is not dense-consecutive starting at 1"
                    )));
                }
            }
        }
        resolved_rows.push(values);
    }

    let guard = TransactionGuard::begin(conn, tx)?;
    guard.conn().execute(&format!("DELETE FROM \"{table_name}\""), [])?;
    for row in &resolved_rows {
        let columns: Vec<&str> = row.iter().map(|(name, _)| name.as_str()).collect();
        let values: Vec<&Value> = row.iter().map(|(_, v)| v).collect();
        let column_list = columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!("INSERT INTO \"{table_name}\" ({column_list}) VALUES ({placeholders})");
        guard
            .conn()
            .execute(&sql, duckdb::params_from_iter(values.iter().map(|v| *v)))
            .map_err(map_insert_error)?;
    }
    guard.commit()?;
    Ok(())
}

fn check_column_set(headers: &[String], expected: &[&str]) -> Result<()> {
    let mut header_set: Vec<&str> = headers.iter().map(|s| s.as_str()).collect();
    let mut expected_set: Vec<&str> = expected.to_vec();
    header_set.sort_unstable();
    expected_set.sort_unstable();
    if header_set != expected_set {
        return Err(Error::csv(format!(
            "CSV columns {headers:?} do not match expected columns {expected:?}"
        )));
    }
    Ok(())
}

fn map_insert_error(e: duckdb::Error) -> Error {
    let message = e.to_string();
    if message.to_ascii_uppercase().contains("UNIQUE") {
        Error::csv("There are duplicate entries in the CSV file.")
    } else {
        Error::from(e)
    }
}
