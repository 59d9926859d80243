//! pgquery CLI - Compile JSON query documents to PostgreSQL
//!
//! Usage:
//!   pgquery compile <query.json> [--statement <kind>] [--config <path>]
//!   pgquery check-config [path]
//!
//! Examples:
//!   pgquery compile demos/active_users.json
//!   pgquery compile demos/active_users.json --statement delete-all
//!   PGQUERY_LOG=pgquery=trace pgquery compile demos/active_users.json
//!
//! A query document looks like:
//!
//! ```json
//! {
//!   "sources": [{ "source": "users", "fields": ["id", "name"], "primary_key": "id" }],
//!   "wheres": [{ "equals": { "left": { "field": { "source": 0, "field": "id" } },
//!                            "right": { "literal": { "integer": 5 } } } }],
//!   "limit": 10
//! }
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use pgquery::compile::Compiler;
use pgquery::config::Settings;
use pgquery::sql::{
    DeleteAll, Distinct, Expr, Join, Lock, OrderByExpr, Query, Schema, Source, UpdateAll,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter.
const LOG_ENV_VAR: &str = "PGQUERY_LOG";

#[derive(Parser)]
#[command(name = "pgquery")]
#[command(about = "pgquery - Compile structured queries to PostgreSQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON query document to SQL
    Compile {
        /// Path to the query document
        file: PathBuf,

        /// Statement to generate from the query
        #[arg(short, long, default_value = "select")]
        statement: StatementArg,

        /// Settings file (defaults to the standard lookup)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate a settings file
    CheckConfig {
        /// Path to the settings file (defaults to the standard lookup)
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatementArg {
    Select,
    UpdateAll,
    DeleteAll,
}

/// JSON form of a query.
///
/// `sources[0]` is the FROM table and `joins[i]` joins `sources[i + 1]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QueryDocument {
    sources: Vec<Schema>,
    #[serde(default)]
    select: Vec<Expr>,
    #[serde(default)]
    distinct: Option<Distinct>,
    #[serde(default)]
    joins: Vec<Join>,
    #[serde(default)]
    wheres: Vec<Expr>,
    #[serde(default)]
    group_bys: Vec<Expr>,
    #[serde(default)]
    havings: Vec<Expr>,
    #[serde(default)]
    order_bys: Vec<OrderByExpr>,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default)]
    lock: Option<Lock>,
    /// Assignments for `update-all`, applied in order.
    #[serde(default)]
    values: Vec<(String, Expr)>,
}

impl QueryDocument {
    fn to_query(&self) -> Query {
        Query {
            sources: self
                .sources
                .iter()
                .map(|schema| Source::new(Arc::new(schema.clone())))
                .collect(),
            select: self.select.clone(),
            distinct: self.distinct.clone(),
            joins: self.joins.clone(),
            wheres: self.wheres.clone(),
            group_bys: self.group_bys.clone(),
            havings: self.havings.clone(),
            order_bys: self.order_bys.clone(),
            limit: self.limit,
            offset: self.offset,
            lock: self.lock.clone(),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| "pgquery=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            file,
            statement,
            config,
        } => cmd_compile(&file, statement, config.as_deref()),
        Commands::CheckConfig { path } => cmd_check_config(path.as_deref()),
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, String> {
    let result = match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    result.map_err(|e| e.to_string())
}

fn cmd_compile(file: &Path, statement: StatementArg, config: Option<&Path>) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Read the document
    let content = match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let document: QueryDocument = match serde_json::from_str(&content) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Invalid query document '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let compiler = Compiler::from_settings(&settings);
    let query = document.to_query();

    let result = match statement {
        StatementArg::Select => compiler.select(&query),
        StatementArg::UpdateAll => {
            compiler.update_all(&UpdateAll::new(&query).set_many(document.values.clone()))
        }
        StatementArg::DeleteAll => compiler.delete_all(&DeleteAll::new(&query)),
    };

    match result {
        Ok(sql) => {
            println!("{}", sql);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_check_config(path: Option<&Path>) -> ExitCode {
    match load_settings(path) {
        Ok(settings) => {
            println!("Configuration OK");
            println!(
                "  compiler.max_expression_depth = {}",
                settings.compiler.max_expression_depth
            );
            println!(
                "  compiler.log_statements = {}",
                settings.compiler.log_statements
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            ExitCode::FAILURE
        }
    }
}
