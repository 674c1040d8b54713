//! Raw SQL passthrough for callers who need a query the attribute-oriented
//! API doesn't model directly (aggregates, joins across collections).

use duckdb::Connection;

use crate::error::{Error, Result};

pub fn query_string(conn: &Connection, sql: &str, params: &[&str]) -> Result<Vec<String>> {
    run_scalar_query(conn, sql, params, |row| row.get::<_, String>(0))
}

pub fn query_integer(conn: &Connection, sql: &str, params: &[&str]) -> Result<Vec<i64>> {
    run_scalar_query(conn, sql, params, |row| row.get::<_, i64>(0))
}

pub fn query_float(conn: &Connection, sql: &str, params: &[&str]) -> Result<Vec<f64>> {
    run_scalar_query(conn, sql, params, |row| row.get::<_, f64>(0))
}

fn run_scalar_query<T>(
    conn: &Connection,
    sql: &str,
    params: &[&str],
    extract: impl Fn(&duckdb::Row<'_>) -> duckdb::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(duckdb::params_from_iter(params.iter()), |row| extract(row))?;
    let mut values = Vec::new();
    for row in rows {
        values.push(row.map_err(Error::from)?);
    }
    Ok(values)
}
