//! In-memory catalog model: tables, columns, foreign keys, indexes.

use ahash::AHashMap;

/// Declared SQL type of a column, as seen by the attribute-oriented model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Real,
    Text,
    DateTime,
}

impl DataType {
    /// Map a raw catalog type name to a [`DataType`], applying the `date_*`
    /// name-promotion rule for otherwise-TEXT columns.
    pub fn from_sql(declared: &str, column_name: &str) -> DataType {
        let upper = declared.to_ascii_uppercase();
        match upper.as_str() {
            "INTEGER" | "BIGINT" | "INT" | "INT8" => DataType::Integer,
            "REAL" | "DOUBLE" | "FLOAT" => DataType::Real,
            "DATE_TIME" | "TIMESTAMP" | "DATETIME" => DataType::DateTime,
            _ => {
                if is_date_name(column_name) {
                    DataType::DateTime
                } else {
                    DataType::Text
                }
            }
        }
    }

    /// The declared SQL type name this crate writes to a schema file.
    pub fn to_sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Text => "TEXT",
            DataType::DateTime => "DATE_TIME",
        }
    }
}

/// `column name starts with date_` — the naming half of DateTime promotion.
pub fn is_date_name(column_name: &str) -> bool {
    column_name.starts_with("date_")
}

/// The dimension column of a time-series group table: the first non-`id`
/// column that is either declared `DateTime` or carries a `date_*` name.
pub fn dimension_column(table: &TableDefinition) -> Option<String> {
    table
        .columns
        .iter()
        .find(|c| c.name != "id" && (c.data_type == DataType::DateTime || is_date_name(&c.name)))
        .map(|c| c.name.clone())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnAction {
    Cascade,
    SetNull,
    NoAction,
    Restrict,
}

impl OnAction {
    pub fn from_sql(s: &str) -> OnAction {
        match s.to_ascii_uppercase().as_str() {
            "CASCADE" => OnAction::Cascade,
            "SET NULL" => OnAction::SetNull,
            "RESTRICT" => OnAction::Restrict,
            _ => OnAction::NoAction,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub not_null: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub on_update: OnAction,
    pub on_delete: OnAction,
}

#[derive(Debug, Clone)]
pub struct IndexDefinition {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    /// Declaration order, not alphabetical — this is load-bearing for CSV
    /// header order and for scalar projection.
    pub columns: Vec<ColumnDefinition>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn foreign_key_on(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.from_column == column)
    }

    /// Non-structural columns: everything except `id`, `vector_index`, and
    /// any foreign-key column. Used by the attribute-collision check.
    pub fn attribute_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| {
            c.name != "id"
                && c.name != "vector_index"
                && !self.foreign_keys.iter().any(|fk| fk.from_column == c.name)
        })
    }
}

/// The full introspected catalog.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub tables: AHashMap<String, TableDefinition>,
}

impl Schema {
    pub fn new(tables: AHashMap<String, TableDefinition>) -> Self {
        Self { tables }
    }

    pub fn get_table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }
}
