use std::path::PathBuf;

use anyhow::Context;
use quiver::csv::load_csv_options;
use quiver::{CsvOptions, Database};

pub fn run(
    database: PathBuf,
    collection: String,
    group: Option<String>,
    input: PathBuf,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let options = match config {
        Some(path) => load_csv_options(&path).with_context(|| format!("loading {}", path.display()))?,
        None => CsvOptions::new(),
    };
    let db = Database::open(&database).with_context(|| format!("opening {}", database.display()))?;
    db.import_csv(&collection, group.as_deref(), &input, &options)
        .with_context(|| format!("importing {} into {collection}", input.display()))?;
    println!("imported {} into {collection}", input.display());
    Ok(())
}
