use std::path::PathBuf;

use anyhow::Context;
use quiver::Database;

pub fn run(database: PathBuf, migrations_dir: PathBuf) -> anyhow::Result<()> {
    let db = Database::from_migrations(&database, &migrations_dir)
        .with_context(|| format!("applying migrations from {} to {}", migrations_dir.display(), database.display()))?;
    let version = db.current_migration_version()?;
    println!("database now at migration version {version}");
    Ok(())
}
