use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_BACKEND, ENV_CONFIG, ENV_DATABASE_URL};
use crate::data::Backend;

#[derive(Parser)]
#[command(name = "gridfilter")]
#[command(version, about = "Compile data grid filter requests into SQL", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Database backend (sqlite or postgres)
    #[arg(long, short = 'b', global = true, env = ENV_BACKEND, value_parser = parse_backend)]
    pub backend: Option<Backend>,

    /// Database connection URL
    #[arg(long, short = 'd', global = true, env = ENV_DATABASE_URL)]
    pub database: Option<String>,
}

/// Parse database backend from CLI/env string
fn parse_backend(s: &str) -> Result<Backend, String> {
    match s.to_lowercase().as_str() {
        "sqlite" => Ok(Backend::Sqlite),
        "postgres" | "postgresql" => Ok(Backend::Postgres),
        _ => Err(format!(
            "Invalid database backend '{}'. Valid options: sqlite, postgres",
            s
        )),
    }
}

/// Parse a `name=path` route definition
fn parse_route(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), path.to_string()))
        }
        _ => Err(format!("Invalid route '{}'. Expected name=path", s)),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compile a descriptor and print the SQL with its bound values
    Compile {
        /// Descriptor JSON file
        #[arg(long)]
        descriptor: PathBuf,

        /// Base entity (name or table) from the configured schema
        #[arg(long, short = 'e')]
        entity: String,
    },
    /// Compile a descriptor, execute it and print the row counts
    Run {
        /// Descriptor JSON file
        #[arg(long)]
        descriptor: PathBuf,

        /// Base entity (name or table) from the configured schema
        #[arg(long, short = 'e')]
        entity: String,

        /// Page size for the fetched rows
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Fill a grid template's read path and page length
    Template {
        /// Template JSON file
        #[arg(long)]
        template: PathBuf,

        /// Named route as name=path (repeatable)
        #[arg(long = "route", value_parser = parse_route)]
        routes: Vec<(String, String)>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub database: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        backend: cli.backend,
        database: cli.database,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("SQLite"), Ok(Backend::Sqlite));
        assert_eq!(parse_backend("postgresql"), Ok(Backend::Postgres));
        assert!(parse_backend("duckdb").is_err());
    }

    #[test]
    fn test_parse_route() {
        assert_eq!(
            parse_route("prefix.suffix=/test"),
            Ok(("prefix.suffix".to_string(), "/test".to_string()))
        );
        assert!(parse_route("prefix.suffix").is_err());
        assert!(parse_route("=/test").is_err());
    }

    #[test]
    fn test_cli_compile_command() {
        let cli = Cli::try_parse_from([
            "gridfilter",
            "--backend",
            "postgres",
            "compile",
            "--descriptor",
            "request.json",
            "-e",
            "filter_test_models",
        ])
        .unwrap();

        assert_eq!(cli.backend, Some(Backend::Postgres));
        assert!(matches!(
            cli.command,
            Commands::Compile { ref entity, .. } if entity == "filter_test_models"
        ));
    }

    #[test]
    fn test_cli_template_routes() {
        let cli = Cli::try_parse_from([
            "gridfilter",
            "template",
            "--template",
            "grid.json",
            "--route",
            "a.b=/x",
            "--route",
            "c.d=/y",
        ])
        .unwrap();

        match cli.command {
            Commands::Template { routes, .. } => assert_eq!(routes.len(), 2),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
