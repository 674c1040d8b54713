//! Loads a [`Schema`] by querying the DuckDB catalog.
//!
//! DuckDB exposes its catalog through `information_schema` views and a
//! handful of `duckdb_*()` table functions. Column lists and nullability
//! come from `information_schema.columns`; primary keys, foreign keys and
//! unique constraints come from `duckdb_constraints()`, whose `constraint_text`
//! column carries the original DDL fragment — we pull `ON UPDATE`/`ON DELETE`
//! actions out of that text with the same small-regex technique the rest of
//! this crate's corpus uses for DDL parsing, since DuckDB does not surface
//! referential actions as separate structured columns.

use ahash::AHashMap;
use duckdb::Connection;
use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{
    ColumnDefinition, DataType, ForeignKey, IndexDefinition, OnAction, Schema, TableDefinition,
};
use crate::error::Result;

static FK_TARGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)FOREIGN\s+KEY\s*\(([^)]+)\)\s*REFERENCES\s+"?(\w+)"?\s*\(([^)]+)\)"#).unwrap()
});
static ON_DELETE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ON\s+DELETE\s+(CASCADE|SET\s+NULL|RESTRICT|NO\s+ACTION)").unwrap());
static ON_UPDATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ON\s+UPDATE\s+(CASCADE|SET\s+NULL|RESTRICT|NO\s+ACTION)").unwrap());
static INDEX_COLUMNS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]+)\)").unwrap());

/// Introspect the full catalog of `conn` into a [`Schema`].
pub fn load_schema(conn: &Connection) -> Result<Schema> {
    let table_names = list_table_names(conn)?;
    let mut tables = AHashMap::with_capacity(table_names.len());

    for name in &table_names {
        let columns = load_columns(conn, name)?;
        let (primary_key_cols, foreign_keys, unique_sets) = load_constraints(conn, name)?;
        let indexes = load_indexes(conn, name, &unique_sets)?;

        let columns = columns
            .into_iter()
            .map(|mut c| {
                c.primary_key = primary_key_cols.contains(&c.name);
                c
            })
            .collect();

        tables.insert(
            name.clone(),
            TableDefinition {
                name: name.clone(),
                columns,
                foreign_keys,
                indexes,
            },
        );
    }

    Ok(Schema::new(tables))
}

fn list_table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = 'main' ORDER BY table_name",
    )?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnDefinition>> {
    let mut stmt = conn.prepare(
        "SELECT column_name, data_type, is_nullable, column_default \
         FROM information_schema.columns \
         WHERE table_schema = 'main' AND table_name = ? \
         ORDER BY ordinal_position",
    )?;
    let rows = stmt
        .query_map([table], |row| {
            let name: String = row.get(0)?;
            let declared: String = row.get(1)?;
            let is_nullable: String = row.get(2)?;
            let default_value: Option<String> = row.get(3)?;
            Ok((name, declared, is_nullable, default_value))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .map(|(name, declared, is_nullable, default_value)| ColumnDefinition {
            data_type: DataType::from_sql(&declared, &name),
            not_null: is_nullable.eq_ignore_ascii_case("NO"),
            primary_key: false,
            default_value,
            name,
        })
        .collect())
}

type UniqueColumnSets = Vec<Vec<String>>;

fn load_constraints(
    conn: &Connection,
    table: &str,
) -> Result<(Vec<String>, Vec<ForeignKey>, UniqueColumnSets)> {
    let mut stmt = conn.prepare(
        "SELECT constraint_type, constraint_text, constraint_column_names \
         FROM duckdb_constraints() \
         WHERE table_name = ?",
    )?;
    let rows = stmt
        .query_map([table], |row| {
            let kind: String = row.get(0)?;
            let text: String = row.get(1)?;
            let columns: Vec<String> = row
                .get::<_, String>(2)
                .map(|s| split_column_list(&s))
                .unwrap_or_default();
            Ok((kind, text, columns))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut primary_key_cols = Vec::new();
    let mut foreign_keys = Vec::new();
    let mut unique_sets = Vec::new();

    for (kind, text, columns) in rows {
        match kind.to_ascii_uppercase().as_str() {
            "PRIMARY KEY" => primary_key_cols.extend(columns),
            "UNIQUE" => unique_sets.push(columns),
            "FOREIGN KEY" => {
                if let Some(fk) = parse_foreign_key(&text, &columns) {
                    foreign_keys.push(fk);
                }
            }
            _ => {}
        }
    }

    Ok((primary_key_cols, foreign_keys, unique_sets))
}

fn parse_foreign_key(constraint_text: &str, from_columns: &[String]) -> Option<ForeignKey> {
    let caps = FK_TARGET_RE.captures(constraint_text)?;
    let from_column = from_columns
        .first()
        .cloned()
        .unwrap_or_else(|| split_column_list(&caps[1]).remove(0));
    let to_table = caps[2].to_string();
    let to_column = split_column_list(&caps[3]).remove(0);

    let on_delete = ON_DELETE_RE
        .captures(constraint_text)
        .map(|c| OnAction::from_sql(&c[1]))
        .unwrap_or(OnAction::NoAction);
    let on_update = ON_UPDATE_RE
        .captures(constraint_text)
        .map(|c| OnAction::from_sql(&c[1]))
        .unwrap_or(OnAction::NoAction);

    Some(ForeignKey {
        from_column,
        to_table,
        to_column,
        on_update,
        on_delete,
    })
}

fn load_indexes(
    conn: &Connection,
    table: &str,
    unique_constraint_sets: &[Vec<String>],
) -> Result<Vec<IndexDefinition>> {
    let mut stmt = conn.prepare(
        "SELECT index_name, is_unique, sql FROM duckdb_indexes() WHERE table_name = ?",
    )?;
    let rows = stmt
        .query_map([table], |row| {
            let name: String = row.get(0)?;
            let unique: bool = row.get(1)?;
            let sql: String = row.get(2)?;
            Ok((name, unique, sql))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut indexes: Vec<IndexDefinition> = rows
        .into_iter()
        .map(|(name, unique, sql)| {
            let columns = INDEX_COLUMNS_RE
                .captures(&sql)
                .map(|c| split_column_list(&c[1]))
                .unwrap_or_default();
            IndexDefinition {
                name,
                unique,
                columns,
            }
        })
        .collect();

    // duckdb_constraints() UNIQUE entries are not always mirrored as named
    // indexes; surface them too so the schema validator sees every
    // UNIQUE-ness signal regardless of which catalog view produced it.
    for (i, columns) in unique_constraint_sets.iter().enumerate() {
        if !indexes.iter().any(|ix| &ix.columns == columns) {
            indexes.push(IndexDefinition {
                name: format!("{table}_unique_{i}"),
                unique: true,
                columns: columns.clone(),
            });
        }
    }

    Ok(indexes)
}

fn split_column_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
