use std::path::PathBuf;

use anyhow::Context;
use quiver::Database;

pub fn run(database: PathBuf) -> anyhow::Result<()> {
    let db = Database::open(&database).with_context(|| format!("opening {}", database.display()))?;
    for line in db.describe() {
        println!("{line}");
    }
    Ok(())
}
