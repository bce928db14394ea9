use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod api;
mod chart;
mod cleaner;
mod config;
mod dataset;
mod db;
mod error;
mod models;
mod pipeline;
mod report;
mod stats;

use config::Config;
use db::{AdmissionSource, PgSource};

#[derive(Parser)]
#[command(name = "admissions-analytics")]
#[command(about = "Cleaned admissions statistics and dashboard charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the analytics HTTP API
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Create or upgrade the database schema
    InitDb,
    /// Print summary statistics as JSON
    Summary {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Print what the cleaner substituted, as JSON
    Quality {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to read configuration")?;
    let pool = db::connect(&config)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind_addr = bind.unwrap_or(config.bind_addr);
            let state = api::AppState {
                source: Arc::new(PgSource::new(pool)),
                default_year: config.default_year,
                cors_allowed_origins: Arc::new(config.cors_allowed_origins.clone()),
            };
            let listener = tokio::net::TcpListener::bind(bind_addr)
                .await
                .with_context(|| format!("failed to bind {bind_addr}"))?;
            info!("admissions-analytics listening on {bind_addr}");
            axum::serve(listener, api::build_router(state))
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("shutting down");
                })
                .await?;
        }
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Summary { year } => {
            let year = year.unwrap_or(config.default_year);
            let view = PgSource::new(pool).admission_view(year).await?;
            let summary = pipeline::build_summary(&view);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Quality { year } => {
            let year = year.unwrap_or(config.default_year);
            let view = PgSource::new(pool).admission_view(year).await?;
            let quality = pipeline::data_quality(&view);
            println!("{}", serde_json::to_string_pretty(&quality)?);
        }
        Commands::Report { year, out } => {
            let year = year.unwrap_or(config.default_year);
            let source = PgSource::new(pool);
            let data = db::fetch_admission_data(&source, year).await?;
            let report = report::build_report(
                &pipeline::build_dashboard(year, &data),
                &pipeline::data_quality(&data.view),
                chrono::Utc::now(),
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
