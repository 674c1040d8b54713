use std::path::PathBuf;

use anyhow::Context;
use quiver::Database;

pub fn run(database: PathBuf, schema_file: PathBuf) -> anyhow::Result<()> {
    Database::bootstrap_with_schema_file(&database, &schema_file)
        .with_context(|| format!("applying {} to {}", schema_file.display(), database.display()))?;
    println!("applied schema from {} to {}", schema_file.display(), database.display());
    Ok(())
}
