//! Core application

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::Config;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::{DatabaseService, SelectQuery};
use crate::filters::{Descriptor, PredicateCompiler, parse_descriptor};
use crate::template::{RouteRegistry, Structure, Template, TemplateMeta};

pub struct CoreApp {
    pub config: Config,
    pub compiler: PredicateCompiler,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;
        match command {
            Commands::Compile { descriptor, entity } => app.compile(&descriptor, &entity),
            Commands::Run {
                descriptor,
                entity,
                limit,
            } => app.execute(&descriptor, &entity, limit).await,
            Commands::Template { template, routes } => app.build_template(&template, routes),
        }
    }

    pub fn init(cli: &CliConfig) -> Result<Self> {
        let config = Config::load(cli)?;
        let compiler = PredicateCompiler::new(config.filters.clone());
        Ok(Self { config, compiler })
    }

    fn init_logging() {
        let default_filter = format!("warn,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // Results go to stdout, logs to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    fn load_descriptor(&self, path: &Path) -> Result<Descriptor> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read descriptor: {}", path.display()))?;
        let descriptor = parse_descriptor(&json, &self.config.filters.limits)
            .with_context(|| format!("Invalid descriptor: {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            entries = descriptor.entry_count(),
            "Descriptor loaded"
        );
        Ok(descriptor)
    }

    /// Build the filtered query for one descriptor file
    pub fn build_query(&self, path: &Path, entity: &str) -> Result<SelectQuery<'_>> {
        let descriptor = self.load_descriptor(path)?;
        let mut query = SelectQuery::new(&self.config.schema, entity, self.config.database.backend)
            .with_context(|| format!("Cannot query entity '{}'", entity))?;
        self.compiler.apply(&descriptor, &mut query)?;
        Ok(query)
    }

    fn compile(&self, path: &Path, entity: &str) -> Result<()> {
        let query = self.build_query(path, entity)?;
        let select = query.to_sql();
        let count = query.count_sql();

        let output = json!({
            "sql": select.sql,
            "params": select.params,
            "count_sql": count.sql,
            "count_params": count.params,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    async fn execute(&self, path: &Path, entity: &str, limit: Option<u32>) -> Result<()> {
        let mut query = self.build_query(path, entity)?;
        if let Some(limit) = limit {
            query.paginate(limit, 0);
        }

        let database = DatabaseService::connect(&self.config.database)
            .await
            .context("Failed to connect to database")?;

        let result = async {
            let total = database.count(&query).await?;
            let fetched = database.fetch_len(&query).await?;
            Ok::<_, crate::data::DataError>((total, fetched))
        }
        .await;
        database.close().await;
        let (total, fetched) = result?;

        tracing::info!(
            entity,
            backend = %database.backend(),
            total,
            fetched,
            "Query executed"
        );
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "total": total, "fetched": fetched }))?
        );
        Ok(())
    }

    fn build_template(&self, path: &Path, routes: Vec<(String, String)>) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read template: {}", path.display()))?;
        let mut template: Template = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse template: {}", path.display()))?;
        let mut meta = TemplateMeta::default();

        let mut registry = RouteRegistry::new();
        for (name, route_path) in routes {
            registry.register(name, route_path);
        }

        Structure::new(&mut template, &mut meta, &registry, &self.config.template).build()?;

        let output = json!({ "template": template, "meta": meta });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"{
        "database": {"backend": "postgres"},
        "schema": {
            "filter_test_models": {
                "table": "filter_test_models",
                "fields": {"id": "integer", "name": "text", "full_name": "text"}
            }
        }
    }"#;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn app() -> (CoreApp, tempfile::NamedTempFile) {
        let config_file = write_file(CONFIG);
        let cli = CliConfig {
            config: Some(config_file.path().to_path_buf()),
            ..Default::default()
        };
        (CoreApp::init(&cli).unwrap(), config_file)
    }

    #[test]
    fn test_build_query_from_files() {
        let (app, _config) = app();
        let descriptor = write_file(
            r#"{
                "columns": [{"data": "name", "searchable": true}],
                "meta": {"search": "Harry"},
                "filters": {"filter_test_models": {"id": 10}}
            }"#,
        );

        let query = app
            .build_query(descriptor.path(), "filter_test_models")
            .unwrap();
        let built = query.to_sql();

        assert!(built.sql.contains("LIKE $1"));
        assert!(built.sql.contains("\"filter_test_models\".\"id\" = $2"));
        assert_eq!(built.params.len(), 2);
    }

    #[test]
    fn test_build_query_unknown_entity() {
        let (app, _config) = app();
        let descriptor = write_file("{}");

        let err = app.build_query(descriptor.path(), "missing").unwrap_err();
        assert!(err.to_string().contains("Cannot query entity 'missing'"));
    }

    #[test]
    fn test_build_query_rejects_bad_descriptor() {
        let (app, _config) = app();
        let descriptor = write_file(r#"{"filters": {"filter_test_models": {"nickname": "x"}}}"#);

        let err = app
            .build_query(descriptor.path(), "filter_test_models")
            .unwrap_err();
        assert!(format!("{:#}", err).contains("nickname"));
    }
}
