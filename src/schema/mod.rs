//! Schema introspection and naming-convention classification.
//!
//! This module provides:
//! - A typed in-memory catalog (tables, columns, foreign keys, indexes)
//! - Classification of tables into collections / vector / set / time-series /
//!   time-series-files groups, purely by name
//! - Loading that catalog from the embedded DuckDB connection

mod classify;
mod introspect;
mod metadata;
mod model;

pub use classify::{
    is_collection_name, is_set_table_name, is_time_series_files_table_name,
    is_time_series_table_name, is_vector_table_name, parent_collection, CONFIGURATION,
};
pub use introspect::load_schema;
pub use metadata::{GroupMetadata, ScalarMetadata};
pub use model::{
    dimension_column, is_date_name, ColumnDefinition, DataType, ForeignKey, IndexDefinition,
    OnAction, Schema, TableDefinition,
};
