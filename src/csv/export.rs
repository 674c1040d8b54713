//! CSV exporter: scalar-collection and group-table export paths.

use std::io::Write;
use std::path::Path;

use duckdb::Connection;

use super::options::CsvOptions;
use crate::error::{Error, Result};
use crate::schema::{DataType, Schema, TableDefinition};
use crate::value::Value;

pub fn export_csv(
    conn: &Connection,
    schema: &Schema,
    collection: &str,
    group: Option<&str>,
    destination: &Path,
    options: &CsvOptions,
) -> Result<()> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent.to_path_buf(), e))?;
    }

    let (headers, rows, types) = match group {
        None => export_scalar_rows(conn, schema, collection)?,
        Some(group) => export_group_rows(conn, schema, collection, group)?,
    };

    let file = std::fs::File::create(destination).map_err(|e| Error::io(destination.to_path_buf(), e))?;
    let mut writer = std::io::BufWriter::new(file);
    writer
        .write_all(b"sep=,\n")
        .map_err(|e| Error::io(destination.to_path_buf(), e))?;

    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(&mut writer);

    csv_writer
        .write_record(headers.iter().map(|h| narrow_latin1(h)))
        .map_err(|e| Error::csv(e.to_string()))?;

    for row in &rows {
        let fields: Vec<Vec<u8>> = row
            .iter()
            .zip(types.iter())
            .map(|(value, (attribute, data_type))| render_field(value, attribute, *data_type, options))
            .collect::<Result<_>>()?;
        csv_writer
            .write_record(fields.iter().map(|f| f.as_slice()))
            .map_err(|e| Error::csv(e.to_string()))?;
    }

    csv_writer.flush().map_err(|e| Error::io(destination.to_path_buf(), e))?;
    Ok(())
}

type Column = (String, DataType);

fn export_scalar_rows(conn: &Connection, schema: &Schema, collection: &str) -> Result<(Vec<String>, Vec<Vec<Value>>, Vec<Column>)> {
    let table = schema
        .get_table(collection)
        .ok_or_else(|| Error::not_found(format!("collection '{collection}' not found")))?;
    let columns: Vec<Column> = table
        .columns
        .iter()
        .filter(|c| c.name != "id")
        .map(|c| (c.name.clone(), c.data_type))
        .collect();
    let headers: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();

    let select_list = headers.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ");
    let sql = format!("SELECT {select_list} FROM \"{collection}\" ORDER BY id ASC");
    let rows = query_rows(conn, &sql, headers.len())?;
    Ok((headers, rows, columns))
}

fn export_group_rows(
    conn: &Connection,
    schema: &Schema,
    collection: &str,
    group: &str,
) -> Result<(Vec<String>, Vec<Vec<Value>>, Vec<Column>)> {
    let table_name = schema
        .find_vector_table(collection, group)
        .or_else(|_| schema.find_set_table(collection, group))
        .or_else(|_| schema.find_time_series_table(collection, group))
        .map_err(|_| Error::not_found(format!("no group table for '{collection}.{group}'")))?;
    let table = schema
        .get_table(&table_name)
        .ok_or_else(|| Error::not_found(format!("table '{table_name}' not found")))?;

    let columns: Vec<Column> = table
        .columns
        .iter()
        .map(|c| (c.name.clone(), c.data_type))
        .collect();
    let headers: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();

    let order_by = order_clause(table);
    let select_columns: Vec<String> = headers
        .iter()
        .map(|c| {
            if c == "id" {
                "C.label AS id".to_string()
            } else {
                format!("G.\"{c}\"")
            }
        })
        .collect();
    let sql = format!(
        "SELECT {} FROM \"{table_name}\" G JOIN \"{collection}\" C ON G.id = C.id ORDER BY {order_by}",
        select_columns.join(", ")
    );
    let rows = query_rows(conn, &sql, headers.len())?;
    Ok((headers, rows, columns))
}

fn order_clause(table: &TableDefinition) -> String {
    if table.has_column("vector_index") {
        "G.id ASC, G.vector_index ASC".to_string()
    } else if let Some(dim) = table
        .columns
        .iter()
        .find(|c| c.name != "id" && (c.data_type == DataType::DateTime || crate::schema::is_date_name(&c.name)))
    {
        format!("G.id ASC, G.\"{}\" ASC", dim.name)
    } else {
        "G.id ASC".to_string()
    }
}

fn query_rows(conn: &Connection, sql: &str, width: usize) -> Result<Vec<Vec<Value>>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], move |row| {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            let value: duckdb::types::Value = row.get(i)?;
            values.push(Value::from(value));
        }
        Ok(values)
    })?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

fn render_field(value: &Value, attribute: &str, data_type: DataType, options: &CsvOptions) -> Result<Vec<u8>> {
    let text = match value {
        Value::Null => String::new(),
        Value::Integer(i) => match options.label_for(attribute, *i) {
            Some(label) => label.to_string(),
            None => i.to_string(),
        },
        Value::Real(f) => format!("{f}"),
        Value::Text(s) => {
            if data_type == DataType::DateTime && !options.date_time_format.is_empty() {
                let dt = Value::parse_iso8601(s)?;
                dt.format(&options.date_time_format).to_string()
            } else {
                s.clone()
            }
        }
    };
    Ok(narrow_latin1(&text))
}

/// Narrow UTF-8 text to Latin-1 bytes; code points beyond `U+00FF` become `?`.
fn narrow_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c as u8 } else { b'?' })
        .collect()
}
