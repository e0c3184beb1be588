//! Command-line interface for the provider.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;

use crate::catalog::{Catalog, InMemoryCatalog, PgCatalog};
use crate::config::{DatabaseConfig, RepositoryConfig};
use crate::error::Result;
use crate::protocol;
use crate::provider::CatalogServer;
use crate::routes::router;

/// Catalog OAI-PMH - Expose a dataset catalog to metadata harvesters.
#[derive(Parser)]
#[command(name = "catalog-oaipmh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the OAI-PMH endpoint over HTTP.
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        /// JSON catalog file (default: PostgreSQL at DATABASE_URL)
        #[arg(long)]
        catalog_file: Option<PathBuf>,
    },

    /// Answer a single request and print the XML response.
    Show {
        /// OAI-PMH verb (e.g., ListRecords)
        verb: String,

        /// Request argument as key=value, may be repeated
        #[arg(short, long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,

        /// JSON catalog file (default: PostgreSQL at DATABASE_URL)
        #[arg(long)]
        catalog_file: Option<PathBuf>,
    },
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty argument name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Open the catalog file when given, else the PostgreSQL catalog.
pub async fn open_catalog(catalog_file: Option<&Path>) -> Result<Arc<dyn Catalog>> {
    match catalog_file {
        Some(path) => Ok(Arc::new(InMemoryCatalog::from_path(path)?)),
        None => {
            let config = DatabaseConfig::from_env()?;
            Ok(Arc::new(PgCatalog::connect(&config).await?))
        }
    }
}

/// Run the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, catalog_file } => serve_command(bind, catalog_file.as_deref()).await,
        Commands::Show {
            verb,
            args,
            catalog_file,
        } => show_command(&verb, args, catalog_file.as_deref()).await,
    }
}

async fn serve_command(bind: SocketAddr, catalog_file: Option<&Path>) -> Result<()> {
    let catalog = open_catalog(catalog_file).await?;
    let server = Arc::new(CatalogServer::new(RepositoryConfig::from_env(), catalog));

    println!(
        "{} {} at {}",
        style("Serving").bold(),
        style(server.config().repository_name()).cyan(),
        style(server.config().base_url()).green()
    );

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("listening on {bind}");

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

async fn show_command(
    verb: &str,
    args: Vec<(String, String)>,
    catalog_file: Option<&Path>,
) -> Result<()> {
    let catalog = open_catalog(catalog_file).await?;
    let server = CatalogServer::new(RepositoryConfig::from_env(), catalog);

    let mut params = vec![("verb".to_string(), verb.to_string())];
    params.extend(args);

    let xml = protocol::handle(&server, &params).await?;
    println!("{xml}");
    Ok(())
}
