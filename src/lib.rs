//! Sensor feature derivation.
//!
//! [`derive_features`] turns an ascending [`Observation`] sequence into a
//! [`FeatureTable`]. [`generate_observations`] supplies a synthetic series and
//! [`build_feature_report`] / [`report_router`] present the result.

mod correlation;
mod features;
mod observability;
mod observation;
mod report;
mod synthetic;

pub use correlation::{
    correlation_matrix, pearson, CorrelationError, CorrelationMatrix, DEFAULT_CORRELATION_COLUMNS,
};
pub use features::{
    assert_schema_compatible, backward_fill, build_feature_schema, cyclic_encoding,
    derive_features, FeatureColumn, FeatureConfig, FeatureDType, FeatureError, FeatureRow,
    FeatureSchema, FeatureTable, FeatureTransformReport, FillPolicy, LagFeatures, OrderingPolicy,
    RollingFeatures, DEFAULT_WINDOW_ROWS, FEATURE_SCHEMA_VERSION,
};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_source_selected, logging_config_from_env,
    LogFormat, LogWriter, LoggingConfig, LoggingInitError,
};
pub use observation::{ordering_violations, Observation};
pub use report::{
    build_feature_report, coolwarm, format_correlation, format_head, render_report_html,
    report_router, Chart, ChartPoint, ChartSeries, FeatureReport, InMemoryReportSource,
    ReportError, ReportSnapshotSource, DEFAULT_HEAD_ROWS,
};
pub use synthetic::{
    generate_observations, synthetic_config_from_env, SyntheticConfig, SyntheticError,
};
