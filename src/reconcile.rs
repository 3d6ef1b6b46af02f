use clap::Parser;
use rag_cache::bootstrap;
use rag_cache::infrastructure::{logging::init_tracing, AppConfig};
use tracing::{info, warn};

/// Brings the embedding cache in line with the corpus and exits.
#[derive(Parser, Debug)]
#[command(name = "reconcile", version, about)]
struct Cli {
    /// Re-embed every document, ignoring cached entries.
    #[arg(long)]
    force: bool,
    /// Delete the cache file before reconciling.
    #[arg(long)]
    clear: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    init_tracing(
        "reconcile=info,rag_cache=info",
        config.config.logging.format,
    );

    let services = bootstrap::embedding_services(&config.config).await?;
    if cli.clear {
        services.manager.clear_cache().await?;
    }

    let report = services.manager.reconcile(&services.corpus, cli.force).await?;
    let status = services.manager.cache_status().await;

    info!(
        embedded = report.embedded_count,
        reused = report.reused_count,
        failed = report.failed_ids.len(),
        duration_ms = report.duration_ms,
        entries = status.entry_count,
        path = %status.path.display(),
        "reconciliation finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_complete() {
        warn!(failed_ids = ?report.failed_ids, "some documents could not be embedded");
        std::process::exit(1);
    }
    Ok(())
}
