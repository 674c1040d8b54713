//! Read-only attribute/group metadata views, thin wrappers over [`Schema`].
//!
//! Carried from `original_source/include/quiver/attribute_metadata.h` as
//! first-class introspection types alongside the typed reads, rather than
//! reimplemented ad hoc at each call site.

use super::model::{ColumnDefinition, DataType, Schema, TableDefinition};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarMetadata {
    pub name: String,
    pub data_type: DataType,
    pub not_null: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
    pub is_foreign_key: bool,
    pub references_collection: Option<String>,
    pub references_column: Option<String>,
}

impl ScalarMetadata {
    fn from_column(column: &ColumnDefinition, table: &TableDefinition) -> Self {
        let fk = table.foreign_key_on(&column.name);
        ScalarMetadata {
            name: column.name.clone(),
            data_type: column.data_type,
            not_null: column.not_null,
            primary_key: column.primary_key,
            default_value: column.default_value.clone(),
            is_foreign_key: fk.is_some(),
            references_collection: fk.map(|f| f.to_table.clone()),
            references_column: fk.map(|f| f.to_column.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMetadata {
    pub group_name: String,
    pub value_columns: Vec<ScalarMetadata>,
    /// Non-empty only for time-series groups: the dimension column(s), in
    /// declaration order (e.g. `["date_time"]`).
    pub dimension_columns: Vec<String>,
}

impl Schema {
    pub fn get_scalar_metadata(&self, collection: &str, attribute: &str) -> Result<ScalarMetadata> {
        let table = self
            .get_table(collection)
            .ok_or_else(|| Error::not_found(format!("collection '{collection}' not found")))?;
        let column = table
            .column(attribute)
            .ok_or_else(|| Error::not_found(format!("scalar attribute '{attribute}' not found in '{collection}'")))?;
        Ok(ScalarMetadata::from_column(column, table))
    }

    pub fn get_vector_metadata(&self, collection: &str, group: &str) -> Result<GroupMetadata> {
        let table_name = self.find_vector_table(collection, group)?;
        let table = self
            .get_table(&table_name)
            .expect("table located by find_vector_table must exist");
        let value_columns = table
            .columns
            .iter()
            .filter(|c| c.name != "id" && c.name != "vector_index")
            .map(|c| ScalarMetadata::from_column(c, table))
            .collect();
        Ok(GroupMetadata {
            group_name: group.to_string(),
            value_columns,
            dimension_columns: Vec::new(),
        })
    }

    pub fn get_set_metadata(&self, collection: &str, group: &str) -> Result<GroupMetadata> {
        let table_name = self.find_set_table(collection, group)?;
        let table = self
            .get_table(&table_name)
            .expect("table located by find_set_table must exist");
        let value_columns = table
            .columns
            .iter()
            .filter(|c| c.name != "id")
            .map(|c| ScalarMetadata::from_column(c, table))
            .collect();
        Ok(GroupMetadata {
            group_name: group.to_string(),
            value_columns,
            dimension_columns: Vec::new(),
        })
    }

    pub fn get_time_series_metadata(&self, collection: &str, group: &str) -> Result<GroupMetadata> {
        let table_name = self.find_time_series_table(collection, group)?;
        let table = self
            .get_table(&table_name)
            .expect("table located by find_time_series_table must exist");
        let dimension = super::dimension_column(table);
        let value_columns = table
            .columns
            .iter()
            .filter(|c| c.name != "id" && Some(c.name.as_str()) != dimension.as_deref())
            .map(|c| ScalarMetadata::from_column(c, table))
            .collect();
        Ok(GroupMetadata {
            group_name: group.to_string(),
            value_columns,
            dimension_columns: dimension.into_iter().collect(),
        })
    }
}
