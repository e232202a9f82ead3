//! CAC Analyzer: marketing spend analysis service and one-shot CLI.
//!
//! `serve` starts the HTTP API; `analyze` runs the engine over local files
//! and prints the report as JSON.

use anyhow::Context;
use cac_api::ApiServer;
use cac_cache::UploadCache;
use cac_core::config::AppConfig;
use cac_core::ParsedTable;
use cac_reporting::{analyze_cac, analyze_raw, BusinessModel, CacAnalysisRequest};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "cac-analyzer")]
#[command(about = "Customer acquisition cost analysis for marketing spend data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// HTTP port (overrides config)
        #[arg(long, env = "CAC_ANALYZER__API__HTTP_PORT")]
        http_port: Option<u16>,

        /// Metrics port (overrides config)
        #[arg(long, env = "CAC_ANALYZER__METRICS__PORT")]
        metrics_port: Option<u16>,
    },
    /// Analyze CSV/JSON exports and print the result.
    Analyze {
        /// Marketing spend file
        #[arg(long)]
        marketing: PathBuf,

        /// Revenue file
        #[arg(long)]
        revenue: PathBuf,

        /// Per-customer file (CAC analysis only)
        #[arg(long)]
        customers: Option<PathBuf>,

        /// Run the multi-methodology CAC analysis instead of the channel report
        #[arg(long, default_value_t = false)]
        cac: bool,

        /// saas, ecommerce, marketplace, subscription, or other
        #[arg(long, default_value = "other")]
        business_model: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cac_analyzer=info,tower_http=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            http_port,
            metrics_port,
        } => serve(http_port, metrics_port).await,
        Command::Analyze {
            marketing,
            revenue,
            customers,
            cac,
            business_model,
        } => {
            let marketing = load_table(&marketing)?;
            let revenue = load_table(&revenue)?;

            let output = if cac {
                let customer_data = customers.as_deref().map(load_table).transpose()?;
                let request = CacAnalysisRequest {
                    business_model: parse_business_model(&business_model)?,
                    marketing_data: marketing.rows,
                    revenue_data: revenue.rows,
                    customer_data: customer_data.map(|t| t.rows),
                    ..Default::default()
                };
                serde_json::to_string_pretty(&analyze_cac(&request))?
            } else {
                if customers.is_some() {
                    warn!("--customers is only used with --cac");
                }
                serde_json::to_string_pretty(&analyze_raw(&marketing.rows, &revenue.rows))?
            };
            println!("{output}");
            Ok(())
        }
    }
}

async fn serve(http_port: Option<u16>, metrics_port: Option<u16>) -> anyhow::Result<()> {
    info!("CAC Analyzer starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(port) = http_port {
        config.api.http_port = port;
    }
    if let Some(port) = metrics_port {
        config.metrics.port = port;
    }

    info!(
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        cache_ttl_secs = config.upload.cache_ttl_secs,
        "Configuration loaded"
    );

    let cache = Arc::new(UploadCache::new(
        config.upload.cache_ttl_secs,
        config.upload.max_cache_entries,
    ));
    let api_server = ApiServer::new(config.clone(), cache.clone());

    if config.metrics.enabled {
        if let Err(e) = api_server.start_metrics().await {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    // Spawn cache maintenance task
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let evicted = cache.evict_expired();
            if evicted > 0 {
                info!(evicted, "Evicted expired uploads");
            }
        }
    });

    info!("CAC Analyzer is ready to serve traffic");

    tokio::select! {
        result = api_server.start_http() => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server failed");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("CAC Analyzer shutting down");
    Ok(())
}

fn load_table(path: &Path) -> anyhow::Result<ParsedTable> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let table = cac_ingest::parse_upload(filename, &bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    info!(file = %path.display(), rows = table.row_count, "Loaded input file");
    Ok(table)
}

fn parse_business_model(raw: &str) -> anyhow::Result<BusinessModel> {
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))
        .with_context(|| format!("unknown business model {raw}"))
}
