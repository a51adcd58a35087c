use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use sales_analytics as analytics;

use analytics::handlers::{self, AppState};
use analytics::services::reports::ReportService;
use analytics::snapshot::SalesSnapshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = analytics::config::load_config()?;
    analytics::config::init_tracing(&cfg.log_level, cfg.log_json);

    let snapshot = SalesSnapshot::from_json_file(&cfg.snapshot_path, cfg.fail_fast)
        .with_context(|| format!("loading snapshot from {}", cfg.snapshot_path))?;

    // The core never reads the clock; the reference timestamp is fixed here
    // at the boundary, once per bundle.
    let as_of = chrono::Utc::now();
    let bundle = ReportService::new(cfg.clone())
        .generate(&snapshot, as_of)
        .context("generating report bundle")?;
    info!(
        revenue = %bundle.kpis.total_revenue,
        customers = bundle.kpis.total_customers,
        "report bundle ready"
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = handlers::router(AppState::new(bundle))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;
    info!("serving reports at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
