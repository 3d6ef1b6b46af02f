use rag_cache::api::{create_router, AppState};
use rag_cache::bootstrap;
use rag_cache::infrastructure::{logging::init_tracing, AppConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(
        "api=debug,rag_cache=debug,tower_http=debug",
        config.config.logging.format,
    );

    let services = bootstrap::embedding_services(&config.config).await?;
    let generation = bootstrap::generation_producer(&config)?;
    let answers = Arc::new(bootstrap::answer_orchestrator(
        &services,
        generation,
        &config.config,
    )?);

    if config.config.rag.reconcile_on_startup {
        let report = services.manager.reconcile(&services.corpus, false).await?;
        if report.is_complete() {
            info!(
                embedded = report.embedded_count,
                reused = report.reused_count,
                duration_ms = report.duration_ms,
                "startup reconciliation done"
            );
        } else {
            warn!(
                failed = report.failed_ids.len(),
                "startup reconciliation incomplete, failed documents retry on the next pass"
            );
        }
    }

    let addr = SocketAddr::new(
        config.config.server.host.parse()?,
        config.config.server.port,
    );
    let state = AppState::new(services.manager, answers, services.corpus, config);
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
