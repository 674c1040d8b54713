use std::path::PathBuf;

use anyhow::Context;
use quiver::csv::load_csv_options;
use quiver::{CsvOptions, Database};

pub fn run(
    database: PathBuf,
    collection: String,
    group: Option<String>,
    out: PathBuf,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let options = match config {
        Some(path) => load_csv_options(&path).with_context(|| format!("loading {}", path.display()))?,
        None => CsvOptions::new(),
    };
    let db = Database::open(&database).with_context(|| format!("opening {}", database.display()))?;
    db.export_csv(&collection, group.as_deref(), &out, &options)
        .with_context(|| format!("exporting {collection} to {}", out.display()))?;
    println!("exported {collection} to {}", out.display());
    Ok(())
}
