//! Embedded attribute-oriented database library on top of DuckDB.
//!
//! A [`Database`] exposes collections (top-level tables with `id` and
//! `label`), elements (scalar attribute bundles), and four kinds of
//! attribute-group table — vector, set, time-series and time-series-files —
//! routed purely by lexical table-name convention (see [`schema`]).

pub mod csv;
pub mod database;
pub mod element;
pub mod error;
pub mod migration;
pub mod query;
pub mod reader;
pub mod schema;
pub mod time_series;
pub mod transaction;
pub mod validator;
pub mod value;
pub mod writer;

pub use csv::CsvOptions;
pub use database::{Database, DatabaseOptions};
pub use element::Element;
pub use error::{Error, Result};
pub use migration::{Migration, MigrationSet};
pub use value::Value;
