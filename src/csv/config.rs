//! Loading [`CsvOptions`] from a YAML configuration file.
//!
//! Enum label tables tend to be long and stable; callers are expected to
//! keep them in a checked-in file rather than building an [`EnumLabels`] by
//! hand for every `export_csv`/`import_csv` call.

use crate::csv::options::{CsvOptions, EnumLabels};
use crate::error::{Error, Result};
use ahash::AHashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk shape of a CSV options file. The locale level is an [`IndexMap`]
/// so the YAML file's declaration order survives into [`EnumLabels`]'s
/// first-locale-wins resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvConfigFile {
    #[serde(default)]
    pub date_time_format: Option<String>,

    /// `attribute -> locale -> label -> integer`.
    #[serde(default)]
    pub enum_labels: AHashMap<String, IndexMap<String, AHashMap<String, i64>>>,
}

impl CsvConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::csv(format!("invalid CSV config file {}: {e}", path.display())))
    }

    pub fn into_options(self) -> CsvOptions {
        let mut options = CsvOptions::new();
        if let Some(format) = self.date_time_format {
            options = options.with_date_time_format(format);
        }

        let enum_labels: EnumLabels = self.enum_labels;
        options.with_enum_labels(enum_labels)
    }
}

/// Load [`CsvOptions`] straight from a YAML file.
pub fn load_csv_options(path: &Path) -> Result<CsvOptions> {
    Ok(CsvConfigFile::load(path)?.into_options())
}
