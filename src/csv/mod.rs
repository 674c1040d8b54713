//! CSV export/import: wire-format handling via the `csv` crate layered
//! under Latin-1 narrowing, enum resolution, FK label rewriting, and a
//! two-phase validate-then-mutate import.

mod config;
mod export;
mod import;
mod options;

pub use config::{load_csv_options, CsvConfigFile};
pub use export::export_csv;
pub use import::import_csv;
pub use options::{CsvOptions, EnumLabels};
