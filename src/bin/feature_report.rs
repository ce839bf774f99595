use sensorfeat::{
    build_feature_report, derive_features, format_correlation, generate_observations,
    init_logging, log_app_start, log_source_selected, logging_config_from_env,
    synthetic_config_from_env, FeatureConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start("feature_report", &logging_cfg);

    let synthetic_cfg = synthetic_config_from_env();
    log_source_selected(
        "feature_report",
        "synthetic",
        synthetic_cfg.seed,
        synthetic_cfg.points,
    );

    let observations = generate_observations(&synthetic_cfg)?;
    let table = derive_features(&observations, &FeatureConfig::default())?;
    let report = build_feature_report(&table, "synthetic")?;

    println!("{}", report.head);
    println!("Feature correlation with failure");
    println!("{}", format_correlation(&report.correlation));
    println!(
        "rows={} filled={} residual_missing={} negative_maintenance_gaps={}",
        report.rows,
        report.transform.filled_values,
        report.transform.residual_missing,
        report.transform.negative_maintenance_gaps
    );

    Ok(())
}
