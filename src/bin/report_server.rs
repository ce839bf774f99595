use std::{net::SocketAddr, sync::Arc};

use sensorfeat::{
    build_feature_report, derive_features, generate_observations, init_logging, log_app_bind,
    log_app_start, log_source_selected, logging_config_from_env, report_router,
    synthetic_config_from_env, FeatureConfig, InMemoryReportSource, ReportSnapshotSource,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start("report_server", &logging_cfg);

    let addr: SocketAddr = std::env::var("SENSORFEAT_REPORT_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;

    let synthetic_cfg = synthetic_config_from_env();
    log_source_selected(
        "report_server",
        "synthetic",
        synthetic_cfg.seed,
        synthetic_cfg.points,
    );
    let observations = generate_observations(&synthetic_cfg)?;
    let table = derive_features(&observations, &FeatureConfig::default())?;
    let report = build_feature_report(&table, "synthetic")?;

    let source: Arc<dyn ReportSnapshotSource> = Arc::new(InMemoryReportSource::new(report));
    let app = report_router(source);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    log_app_bind(bound_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
