use std::path::PathBuf;

use anyhow::Context;
use quiver::Database;

pub fn run(database: PathBuf, sql: String, params: Vec<String>) -> anyhow::Result<()> {
    let db = Database::open(&database).with_context(|| format!("opening {}", database.display()))?;
    let params: Vec<&str> = params.iter().map(|s| s.as_str()).collect();
    let rows = db.query_string(&sql, &params).with_context(|| "running query")?;
    for row in rows {
        println!("{row}");
    }
    Ok(())
}
