mod apply_schema;
mod describe;
mod export_csv;
mod import_csv;
mod migrate;
mod query;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

const AFTER_HELP: &str = "Common workflows:
  Apply pending migrations:
    quiver-cli migrate db.duckdb migrations/

  Export a collection to CSV:
    quiver-cli export-csv db.duckdb Plant plants.csv

  Import a CSV into a collection:
    quiver-cli import-csv db.duckdb Plant plants.csv

More info:
  Run 'quiver-cli <command> --help' for command-specific options.";

#[derive(Parser)]
#[command(name = "quiver-cli")]
#[command(version)]
#[command(about = "Administrative CLI for a quiver-backed attribute-oriented database")]
#[command(after_help = AFTER_HELP)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

const INPUT_OUTPUT: &str = "Input/Output";

#[derive(Subcommand)]
pub enum Commands {
    /// Apply every pending migration in a migrations directory
    Migrate {
        #[arg(value_hint = ValueHint::FilePath, help_heading = INPUT_OUTPUT)]
        database: PathBuf,
        #[arg(value_hint = ValueHint::DirPath, help_heading = INPUT_OUTPUT)]
        migrations_dir: PathBuf,
    },

    /// Apply a single schema.sql file to a fresh database
    ApplySchema {
        #[arg(value_hint = ValueHint::FilePath, help_heading = INPUT_OUTPUT)]
        database: PathBuf,
        #[arg(value_hint = ValueHint::FilePath, help_heading = INPUT_OUTPUT)]
        schema_file: PathBuf,
    },

    /// Export a collection, or one of its groups, to CSV
    ExportCsv {
        #[arg(value_hint = ValueHint::FilePath, help_heading = INPUT_OUTPUT)]
        database: PathBuf,
        collection: String,
        /// Export an attribute group instead of the collection's scalars
        #[arg(short, long)]
        group: Option<String>,
        #[arg(value_hint = ValueHint::FilePath, help_heading = INPUT_OUTPUT)]
        out: PathBuf,
        /// YAML file with date_time_format/enum_labels overrides
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
    },

    /// Import a CSV file into a collection, or one of its groups
    ImportCsv {
        #[arg(value_hint = ValueHint::FilePath, help_heading = INPUT_OUTPUT)]
        database: PathBuf,
        collection: String,
        #[arg(short, long)]
        group: Option<String>,
        #[arg(value_hint = ValueHint::FilePath, help_heading = INPUT_OUTPUT)]
        input: PathBuf,
        /// YAML file with date_time_format/enum_labels overrides
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
    },

    /// Run a parameterized SQL query and print the first column
    Query {
        #[arg(value_hint = ValueHint::FilePath, help_heading = INPUT_OUTPUT)]
        database: PathBuf,
        sql: String,
        /// Positional bind parameters, bound as text
        params: Vec<String>,
    },

    /// Print the introspected schema, grouped by table kind
    Describe {
        #[arg(value_hint = ValueHint::FilePath, help_heading = INPUT_OUTPUT)]
        database: PathBuf,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Migrate { database, migrations_dir } => migrate::run(database, migrations_dir),
        Commands::ApplySchema { database, schema_file } => apply_schema::run(database, schema_file),
        Commands::ExportCsv { database, collection, group, out, config } => {
            export_csv::run(database, collection, group, out, config)
        }
        Commands::ImportCsv { database, collection, group, input, config } => {
            import_csv::run(database, collection, group, input, config)
        }
        Commands::Query { database, sql, params } => query::run(database, sql, params),
        Commands::Describe { database } => describe::run(database),
    }
}
