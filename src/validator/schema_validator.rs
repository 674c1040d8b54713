//! Rejects any introspected [`Schema`] that does not obey the
//! collection/vector/set/time-series naming and structural convention.

use ahash::AHashSet;

use crate::error::{Error, Result};
use crate::schema::{
    is_date_name, is_set_table_name, is_time_series_files_table_name, is_time_series_table_name,
    is_vector_table_name, DataType, OnAction, Schema, TableDefinition, CONFIGURATION,
};

pub struct SchemaValidator<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_configuration_exists()?;
        self.validate_collection_names()?;

        for table in self.schema.tables.values() {
            if self.schema.is_collection(&table.name) {
                self.validate_collection(table)?;
            } else if self.schema.is_vector_table(&table.name) {
                self.validate_vector_table(table)?;
            } else if self.schema.is_set_table(&table.name) {
                self.validate_set_table(table)?;
            } else if self.schema.is_time_series_table(&table.name) {
                self.validate_time_series_table(table)?;
            } else if self.schema.is_time_series_files_table(&table.name) {
                self.validate_time_series_files_table(table)?;
            }
        }

        self.validate_no_duplicate_attributes()?;
        self.validate_foreign_keys()?;
        Ok(())
    }

    fn validate_configuration_exists(&self) -> Result<()> {
        if !self.schema.has_table(CONFIGURATION) {
            return Err(Error::schema(format!(
                "required table '{CONFIGURATION}' is missing"
            )));
        }
        Ok(())
    }

    fn validate_collection_names(&self) -> Result<()> {
        for name in self.schema.table_names() {
            let looks_like_group = is_vector_table_name(name)
                || is_set_table_name(name)
                || is_time_series_table_name(name)
                || is_time_series_files_table_name(name);
            if !looks_like_group && name != CONFIGURATION && name.contains('_') {
                return Err(Error::schema(format!(
                    "collection name '{name}' must not contain '_'"
                )));
            }
        }
        Ok(())
    }

    fn validate_collection(&self, table: &TableDefinition) -> Result<()> {
        let id = table
            .column("id")
            .ok_or_else(|| self.rule_error(table, "collection must have an 'id' column"))?;
        if !id.primary_key || id.data_type != DataType::Integer {
            return Err(self.rule_error(table, "'id' must be an INTEGER primary key"));
        }

        let label = table
            .column("label")
            .ok_or_else(|| self.rule_error(table, "collection must have a 'label' column"))?;
        if label.data_type != DataType::Text || !label.not_null {
            return Err(self.rule_error(table, "'label' must be TEXT NOT NULL"));
        }
        let label_is_unique = table
            .indexes
            .iter()
            .any(|ix| ix.unique && ix.columns == ["label"]);
        if !label_is_unique {
            return Err(self.rule_error(table, "'label' must carry a UNIQUE index"));
        }
        Ok(())
    }

    fn validate_vector_table(&self, table: &TableDefinition) -> Result<()> {
        let pk = table.primary_key_columns();
        if pk != ["id", "vector_index"] {
            return Err(self.rule_error(
                table,
                "vector table must have composite primary key (id, vector_index)",
            ));
        }
        let parent_fk = table
            .foreign_key_on("id")
            .ok_or_else(|| self.rule_error(table, "vector table must have a FK on 'id'"))?;
        if parent_fk.on_delete != OnAction::Cascade || parent_fk.on_update != OnAction::Cascade {
            return Err(self.rule_error(
                table,
                "vector table parent FK must be ON DELETE CASCADE ON UPDATE CASCADE",
            ));
        }
        let vector_index = table
            .column("vector_index")
            .ok_or_else(|| self.rule_error(table, "vector table must have 'vector_index'"))?;
        if vector_index.primary_key && table.primary_key_columns().len() == 1 {
            return Err(self.rule_error(table, "'vector_index' must not be a lone primary key"));
        }
        Ok(())
    }

    fn validate_set_table(&self, table: &TableDefinition) -> Result<()> {
        table
            .foreign_key_on("id")
            .ok_or_else(|| self.rule_error(table, "set table must have a FK on 'id'"))?;

        let unique_columns: AHashSet<&str> = table
            .indexes
            .iter()
            .filter(|ix| ix.unique)
            .flat_map(|ix| ix.columns.iter().map(|c| c.as_str()))
            .collect();
        if unique_columns.is_empty() {
            return Err(self.rule_error(table, "set table must carry at least one UNIQUE constraint"));
        }
        for column in table.attribute_columns() {
            if !unique_columns.contains(column.name.as_str()) {
                return Err(self.rule_error(
                    table,
                    format!("set column '{}' does not participate in any UNIQUE constraint", column.name),
                ));
            }
        }
        Ok(())
    }

    fn validate_time_series_table(&self, table: &TableDefinition) -> Result<()> {
        table
            .foreign_key_on("id")
            .ok_or_else(|| self.rule_error(table, "time-series table must have a FK on 'id'"))?;

        let has_dimension = table
            .columns
            .iter()
            .filter(|c| c.name != "id")
            .any(|c| c.data_type == DataType::DateTime || is_date_name(&c.name));
        if !has_dimension {
            return Err(self.rule_error(
                table,
                "time-series table must have a DateTime or date_* dimension column",
            ));
        }
        Ok(())
    }

    fn validate_time_series_files_table(&self, table: &TableDefinition) -> Result<()> {
        for column in &table.columns {
            if column.data_type != DataType::Text {
                return Err(self.rule_error(
                    table,
                    format!("time-series-files column '{}' must be TEXT", column.name),
                ));
            }
        }
        let parent = crate::schema::parent_collection(&table.name);
        if !self.schema.has_table(&parent) {
            return Err(self.rule_error(
                table,
                format!("parent collection '{parent}' does not exist"),
            ));
        }
        Ok(())
    }

    fn validate_no_duplicate_attributes(&self) -> Result<()> {
        for collection in self.schema.collection_names() {
            let mut seen: AHashSet<String> = AHashSet::new();
            let table = self
                .schema
                .get_table(collection)
                .expect("collection name came from the schema itself");
            for column in table.attribute_columns() {
                if !seen.insert(column.name.clone()) {
                    return Err(Error::schema(format!(
                        "attribute '{}' is declared twice on collection '{collection}'",
                        column.name
                    )));
                }
            }
            for group in self.schema.tables.values() {
                if group.name == collection
                    || crate::schema::parent_collection(&group.name) != collection
                {
                    continue;
                }
                for column in group.attribute_columns() {
                    if is_date_name(&column.name) {
                        continue;
                    }
                    if !seen.insert(column.name.clone()) {
                        return Err(Error::schema(format!(
                            "attribute '{}' collides across group tables of collection '{collection}'",
                            column.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_foreign_keys(&self) -> Result<()> {
        for table in self.schema.tables.values() {
            for fk in &table.foreign_keys {
                if fk.on_update != OnAction::Cascade {
                    return Err(self.rule_error(
                        table,
                        format!("FK '{}' must be ON UPDATE CASCADE", fk.from_column),
                    ));
                }
                if !matches!(fk.on_delete, OnAction::Cascade | OnAction::SetNull) {
                    return Err(self.rule_error(
                        table,
                        format!(
                            "FK '{}' ON DELETE must be SET NULL or CASCADE",
                            fk.from_column
                        ),
                    ));
                }
                if fk.on_delete == OnAction::SetNull {
                    if let Some(column) = table.column(&fk.from_column) {
                        if column.not_null {
                            return Err(self.rule_error(
                                table,
                                format!(
                                    "FK '{}' is ON DELETE SET NULL but declared NOT NULL",
                                    fk.from_column
                                ),
                            ));
                        }
                    }
                }
                let name_ok = fk.from_column.ends_with("_id")
                    || fk.from_column.contains("_id")
                    || fk.from_column.starts_with(&fk.to_table);
                if !name_ok {
                    return Err(self.rule_error(
                        table,
                        format!(
                            "FK column '{}' does not follow the <target>_id naming convention",
                            fk.from_column
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    fn rule_error(&self, table: &TableDefinition, message: impl Into<String>) -> Error {
        Error::schema(format!("table '{}': {}", table.name, message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDefinition, ForeignKey, IndexDefinition, Schema, TableDefinition};
    use ahash::AHashMap;

    fn configuration_table() -> TableDefinition {
        TableDefinition {
            name: CONFIGURATION.to_string(),
            columns: vec![
                ColumnDefinition {
                    name: "id".into(),
                    data_type: DataType::Integer,
                    not_null: true,
                    primary_key: true,
                    default_value: None,
                },
                ColumnDefinition {
                    name: "label".into(),
                    data_type: DataType::Text,
                    not_null: true,
                    primary_key: false,
                    default_value: None,
                },
            ],
            foreign_keys: vec![],
            indexes: vec![IndexDefinition {
                name: "configuration_label_unique".into(),
                unique: true,
                columns: vec!["label".into()],
            }],
        }
    }

    #[test]
    fn accepts_minimal_valid_schema() {
        let mut tables = AHashMap::new();
        tables.insert(CONFIGURATION.to_string(), configuration_table());
        let schema = Schema::new(tables);
        assert!(SchemaValidator::new(&schema).validate().is_ok());
    }

    #[test]
    fn rejects_schema_without_configuration() {
        let schema = Schema::new(AHashMap::new());
        let err = SchemaValidator::new(&schema).validate().unwrap_err();
        assert!(err.to_string().contains("Configuration"));
    }

    #[test]
    fn rejects_collection_name_with_underscore() {
        let mut tables = AHashMap::new();
        tables.insert(CONFIGURATION.to_string(), configuration_table());
        let mut bad = configuration_table();
        bad.name = "Bad_Name".into();
        tables.insert("Bad_Name".into(), bad);
        let schema = Schema::new(tables);
        let err = SchemaValidator::new(&schema).validate().unwrap_err();
        assert!(err.to_string().contains("must not contain"));
    }

    #[test]
    fn rejects_vector_table_without_cascade() {
        let mut tables = AHashMap::new();
        tables.insert(CONFIGURATION.to_string(), configuration_table());
        let plant = TableDefinition {
            name: "Plant".into(),
            columns: vec![
                ColumnDefinition {
                    name: "id".into(),
                    data_type: DataType::Integer,
                    not_null: true,
                    primary_key: true,
                    default_value: None,
                },
                ColumnDefinition {
                    name: "label".into(),
                    data_type: DataType::Text,
                    not_null: true,
                    primary_key: false,
                    default_value: None,
                },
            ],
            foreign_keys: vec![],
            indexes: vec![IndexDefinition {
                name: "plant_label_unique".into(),
                unique: true,
                columns: vec!["label".into()],
            }],
        };
        tables.insert("Plant".into(), plant);

        let vector_table = TableDefinition {
            name: "Plant_vector_cost".into(),
            columns: vec![
                ColumnDefinition {
                    name: "id".into(),
                    data_type: DataType::Integer,
                    not_null: true,
                    primary_key: true,
                    default_value: None,
                },
                ColumnDefinition {
                    name: "vector_index".into(),
                    data_type: DataType::Integer,
                    not_null: true,
                    primary_key: true,
                    default_value: None,
                },
                ColumnDefinition {
                    name: "cost".into(),
                    data_type: DataType::Real,
                    not_null: false,
                    primary_key: false,
                    default_value: None,
                },
            ],
            foreign_keys: vec![ForeignKey {
                from_column: "id".into(),
                to_table: "Plant".into(),
                to_column: "id".into(),
                on_update: OnAction::NoAction,
                on_delete: OnAction::NoAction,
            }],
            indexes: vec![],
        };
        tables.insert("Plant_vector_cost".into(), vector_table);

        let schema = Schema::new(tables);
        let err = SchemaValidator::new(&schema).validate().unwrap_err();
        assert!(err.to_string().contains("CASCADE"));
    }
}
