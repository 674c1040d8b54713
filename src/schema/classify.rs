//! Table-kind classification by naming convention (lexical only — this
//! must match bit-for-bit or validation diverges from the writer/reader
//! that route through the same rules).

use super::model::{Schema, TableDefinition};
use crate::error::{Error, Result};

pub const CONFIGURATION: &str = "Configuration";
const VECTOR_MARKER: &str = "_vector_";
const SET_MARKER: &str = "_set_";
const TIME_SERIES_MARKER: &str = "_time_series_";
const TIME_SERIES_FILES_SUFFIX: &str = "_time_series_files";

pub fn is_collection_name(name: &str) -> bool {
    name == CONFIGURATION || !name.contains('_')
}

pub fn is_vector_table_name(name: &str) -> bool {
    name.contains(VECTOR_MARKER)
}

pub fn is_set_table_name(name: &str) -> bool {
    name.contains(SET_MARKER)
}

pub fn is_time_series_files_table_name(name: &str) -> bool {
    name.ends_with(TIME_SERIES_FILES_SUFFIX)
}

pub fn is_time_series_table_name(name: &str) -> bool {
    name.contains(TIME_SERIES_MARKER) && !is_time_series_files_table_name(name)
}

/// Prefix up to the first `_`; `""` for a bare collection name.
pub fn parent_collection(name: &str) -> String {
    match name.find('_') {
        Some(idx) => name[..idx].to_string(),
        None => String::new(),
    }
}

impl Schema {
    pub fn is_collection(&self, name: &str) -> bool {
        is_collection_name(name) && self.has_table(name)
    }

    pub fn is_vector_table(&self, name: &str) -> bool {
        is_vector_table_name(name) && self.has_table(name)
    }

    pub fn is_set_table(&self, name: &str) -> bool {
        is_set_table_name(name) && self.has_table(name)
    }

    pub fn is_time_series_table(&self, name: &str) -> bool {
        is_time_series_table_name(name) && self.has_table(name)
    }

    pub fn is_time_series_files_table(&self, name: &str) -> bool {
        is_time_series_files_table_name(name) && self.has_table(name)
    }

    pub fn parent_collection(&self, table: &str) -> String {
        if self.is_collection(table) {
            String::new()
        } else {
            parent_collection(table)
        }
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.tables
            .keys()
            .map(|s| s.as_str())
            .filter(|name| self.is_collection(name))
            .collect()
    }

    fn group_tables_of(&self, collection: &str) -> impl Iterator<Item = &TableDefinition> {
        self.tables.values().filter(move |t| {
            t.name.starts_with(&format!("{collection}_")) && t.name != collection
        })
    }

    pub fn data_type(&self, table: &str, column: &str) -> Result<super::model::DataType> {
        self.get_table(table)
            .and_then(|t| t.column(column))
            .map(|c| c.data_type)
            .ok_or_else(|| {
                Error::not_found(format!("column '{column}' not found on table '{table}'"))
            })
    }

    /// Resolve `<collection>_vector_<attribute>`, falling back to scanning
    /// every vector table of the collection for one carrying a column named
    /// `attribute`.
    pub fn find_vector_table(&self, collection: &str, attribute: &str) -> Result<String> {
        self.find_group_table(collection, attribute, is_vector_table_name, "vector")
    }

    pub fn find_set_table(&self, collection: &str, attribute: &str) -> Result<String> {
        self.find_group_table(collection, attribute, is_set_table_name, "set")
    }

    pub fn find_time_series_table(&self, collection: &str, attribute: &str) -> Result<String> {
        self.find_group_table(
            collection,
            attribute,
            is_time_series_table_name,
            "time-series",
        )
    }

    pub fn find_time_series_files_table(&self, collection: &str) -> Result<String> {
        let conventional = format!("{collection}{TIME_SERIES_FILES_SUFFIX}");
        if self.has_table(&conventional) {
            return Ok(conventional);
        }
        Err(Error::not_found(format!(
            "no time-series-files table for collection '{collection}'"
        )))
    }

    fn find_group_table(
        &self,
        collection: &str,
        attribute: &str,
        kind_predicate: fn(&str) -> bool,
        kind_label: &str,
    ) -> Result<String> {
        let conventional = format!("{collection}_{}_{attribute}", group_marker(kind_label));
        if self.has_table(&conventional) && kind_predicate(&conventional) {
            return Ok(conventional);
        }
        for table in self.group_tables_of(collection) {
            if kind_predicate(&table.name) && table.has_column(attribute) {
                return Ok(table.name.clone());
            }
        }
        Err(Error::not_found(format!(
            "no {kind_label} table on collection '{collection}' carries attribute '{attribute}'"
        )))
    }
}

fn group_marker(kind_label: &str) -> &'static str {
    match kind_label {
        "vector" => "vector",
        "set" => "set",
        "time-series" => "time_series",
        _ => unreachable!("unknown group kind"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_substring() {
        assert!(is_collection_name("Plant"));
        assert!(is_collection_name("Configuration"));
        assert!(!is_collection_name("Plant_vector_cost"));
        assert!(is_vector_table_name("Plant_vector_cost"));
        assert!(is_set_table_name("Plant_set_fuel"));
        assert!(is_time_series_table_name("Plant_time_series_generation"));
        assert!(!is_time_series_table_name("Plant_time_series_files"));
        assert!(is_time_series_files_table_name("Plant_time_series_files"));
    }

    #[test]
    fn parent_collection_is_prefix_up_to_first_underscore() {
        assert_eq!(parent_collection("Plant_vector_cost"), "Plant");
        assert_eq!(parent_collection("Plant"), "");
    }
}
