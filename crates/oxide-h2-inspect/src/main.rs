//! oxide-h2-inspect CLI
//!
//! Command-line tool for inspecting the catalog of an H2 database and
//! resolving in-doubt two-phase transactions.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_h2::connect::jdbc_url;
use oxide_h2::ddl::recreate_table;
use oxide_h2::prelude::*;
use oxide_h2_sqlx::SqlxExecutor;

/// Inspect the catalog of an H2 database.
#[derive(Parser)]
#[command(name = "oxide-h2-inspect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// URL of the H2 server's PostgreSQL listener.
    #[arg(short, long, env = "H2_SERVER_URL", default_value = "postgres://sa@localhost:5435")]
    server: String,

    /// H2 database name (`mem:name`, `~/path`, ...).
    #[arg(short, long, env = "H2_DATABASE", default_value = "mem:test")]
    database: String,

    /// Schema to inspect (the configured default if not specified).
    #[arg(long)]
    schema: Option<String>,

    /// Dialect configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the JDBC URL for the database.
    Url,

    /// List schemas.
    Schemas,

    /// List tables of a schema.
    Tables,

    /// List views of a schema.
    Views,

    /// Describe one table.
    Reflect {
        /// Table name.
        table: String,

        /// Output format.
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Print the DDL that recreates a table.
    Ddl {
        /// Table name.
        table: String,
    },

    /// List prepared transactions awaiting resolution.
    InDoubt,

    /// Commit or roll back a prepared transaction.
    Resolve {
        /// Transaction id.
        xid: String,

        /// Roll back instead of committing.
        #[arg(long)]
        rollback: bool,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DialectConfig> {
    let Some(path) = path else {
        return Ok(DialectConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_table(table: &TableReflection) {
    match table.schema {
        Some(ref schema) => println!("\n{schema}.{}", table.name),
        None => println!("\n{}", table.name),
    }
    println!("{:-<60}", "");
    for column in &table.columns {
        let mut flags = Vec::new();
        if !column.nullable {
            flags.push(String::from("NOT NULL"));
        }
        if column.autoincrement {
            flags.push(String::from("AUTO_INCREMENT"));
        }
        if let Some(ref default) = column.default {
            flags.push(format!("DEFAULT {default}"));
        }
        println!(
            " {:<24} {:<16} {}",
            column.name,
            column.ty.to_string(),
            flags.join(" ")
        );
    }
    if !table.primary_key.constrained_columns.is_empty() {
        println!(
            "\n PRIMARY KEY {} ({})",
            table.primary_key.name.as_deref().unwrap_or(""),
            table.primary_key.constrained_columns.join(", ")
        );
    }
    for fk in &table.foreign_keys {
        let target = match fk.referred_schema {
            Some(ref schema) => format!("{schema}.{}", fk.referred_table),
            None => fk.referred_table.clone(),
        };
        println!(
            " FOREIGN KEY {} ({}) -> {target} ({})",
            fk.name,
            fk.constrained_columns.join(", "),
            fk.referred_columns.join(", ")
        );
    }
    for index in &table.indexes {
        let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
        println!(" {kind} {} ({})", index.name, index.column_names.join(", "));
    }
    for warning in &table.warnings {
        println!(" warning: {warning}");
    }
    println!();
}

fn print_names(names: &[String], empty: &str) {
    if names.is_empty() {
        info!("{empty}");
    } else {
        for name in names {
            println!("{name}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Url = cli.command {
        println!("{}", jdbc_url(&cli.database));
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let mut executor = SqlxExecutor::connect(&cli.server, &cli.database)
        .with_context(|| format!("connecting to {}", cli.server))?;
    let cache = ReflectionCache::new();
    let reflector = Reflector::new(&config).with_cache(&cache);
    let schema = cli.schema.as_deref();

    match cli.command {
        Commands::Url => {}

        Commands::Schemas => {
            let schemas = reflector.list_schemas(&mut executor)?;
            print_names(&schemas, "No schemas found.");
        }

        Commands::Tables => {
            let tables = reflector.list_tables(&mut executor, schema)?;
            print_names(&tables, "No tables found.");
        }

        Commands::Views => {
            let views = reflector.list_views(&mut executor, schema)?;
            print_names(&views, "No views found.");
        }

        Commands::Reflect { table, format } => {
            if !reflector.table_exists(&mut executor, &table, schema)? {
                anyhow::bail!("table {table} does not exist");
            }
            let reflection = reflector.reflect_table(&mut executor, &table, schema)?;
            match format {
                Format::Text => print_table(&reflection),
                Format::Json => println!("{}", serde_json::to_string_pretty(&reflection)?),
            }
        }

        Commands::Ddl { table } => {
            if !reflector.table_exists(&mut executor, &table, schema)? {
                anyhow::bail!("table {table} does not exist");
            }
            let reflection = reflector.reflect_table(&mut executor, &table, schema)?;
            let ddl = DdlCompiler::new();
            for statement in recreate_table(&reflection) {
                println!("{};\n", ddl.generate_sql(&statement));
            }
        }

        Commands::InDoubt => {
            let xids = TransactionCoordinator::new(&config).recover_in_doubt(&mut executor)?;
            print_names(&xids, "No in-doubt transactions.");
        }

        Commands::Resolve { xid, rollback } => {
            let coordinator = TransactionCoordinator::new(&config);
            if rollback {
                coordinator.rollback_twophase(&mut executor, &xid, true, true)?;
                info!("Rolled back {xid}.");
            } else {
                coordinator.commit_twophase(&mut executor, &xid, true, true)?;
                info!("Committed {xid}.");
            }
        }
    }

    executor.close();
    Ok(())
}
