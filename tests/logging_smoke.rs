use std::io;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, TimeZone, Utc};
use sensorfeat::{
    build_feature_report, derive_features, generate_observations, log_app_bind, log_app_start,
    log_source_selected, report_router, FeatureConfig, InMemoryReportSource, LoggingConfig,
    Observation, SyntheticConfig,
};
use tower::util::ServiceExt;
use tracing::dispatcher::with_default;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriter;

#[derive(Clone, Default)]
struct SharedWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
    fn output_string(&self) -> String {
        let bytes = self
            .inner
            .lock()
            .expect("writer lock should not be poisoned");
        String::from_utf8_lossy(&bytes).to_string()
    }
}

struct SharedWriterGuard {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for SharedWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = self
            .inner
            .lock()
            .expect("writer lock should not be poisoned");
        out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs(max_level: Level, f: impl FnOnce()) -> String {
    let writer = SharedWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_max_level(max_level)
        .with_writer(writer.clone())
        .finish();
    let dispatch = tracing::Dispatch::new(subscriber);

    with_default(&dispatch, f);
    writer.output_string()
}

fn short_series(points: usize) -> Vec<Observation> {
    let start = Utc
        .with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
        .single()
        .expect("valid UTC timestamp expected");
    (0..points)
        .map(|idx| Observation {
            timestamp: start + Duration::hours(idx as i64),
            temperature: 50.0,
            pressure: 30.0,
            operation_hours: idx as u64,
            failure: false,
            last_maintenance: start,
        })
        .collect()
}

#[test]
fn transform_logs_start_and_finish() {
    let logs = capture_logs(Level::INFO, || {
        let table = derive_features(&short_series(30), &FeatureConfig::default())
            .expect("transform should succeed");
        assert_eq!(table.len(), 30);
    });

    assert!(logs.contains("\"event\":\"features.transform.start\""));
    assert!(logs.contains("\"event\":\"features.transform.finish\""));
    assert!(!logs.contains("\"event\":\"features.transform.residual_missing\""));
}

#[test]
fn transform_warns_on_residual_gaps_and_unordered_input() {
    let logs = capture_logs(Level::INFO, || {
        let mut rows = short_series(5);
        rows.swap(0, 4);
        let table =
            derive_features(&rows, &FeatureConfig::default()).expect("transform should succeed");
        assert!(table.report.residual_missing > 0);
    });

    assert!(logs.contains("\"event\":\"features.transform.residual_missing\""));
    assert!(logs.contains("\"event\":\"features.transform.unordered_input\""));
}

#[test]
fn schema_build_is_logged_at_debug() {
    let logs = capture_logs(Level::DEBUG, || {
        derive_features(&short_series(2), &FeatureConfig::default())
            .expect("transform should succeed");
    });

    assert!(logs.contains("\"event\":\"features.schema.built\""));
}

#[test]
fn synthetic_source_and_report_build_emit_events() {
    let logs = capture_logs(Level::INFO, || {
        let cfg = SyntheticConfig {
            seed: Some(11),
            points: 30,
            ..SyntheticConfig::default()
        };
        let observations = generate_observations(&cfg).expect("synthetic series");
        let table = derive_features(&observations, &FeatureConfig::default())
            .expect("transform should succeed");
        build_feature_report(&table, "synthetic").expect("report should build");
    });

    assert!(logs.contains("\"event\":\"synthetic.generate.finish\""));
    assert!(logs.contains("\"event\":\"report.build.finish\""));
}

#[test]
fn server_lifecycle_helpers_emit_baseline_events() {
    let logs = capture_logs(Level::INFO, || {
        let cfg = LoggingConfig::default();
        log_app_start("report_server", &cfg);
        log_source_selected("report_server", "synthetic", Some(7), 100);
        log_source_selected("report_server", "synthetic", None, 100);
        log_app_bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080));
    });

    assert!(logs.contains("\"event\":\"app.start\""));
    assert!(logs.contains("\"event\":\"source.selected\""));
    assert!(logs.contains("\"seed\":\"entropy\""));
    assert!(logs.contains("\"event\":\"app.bind\""));
}

#[test]
fn snapshot_route_emits_http_snapshot_event() {
    let table = derive_features(&short_series(30), &FeatureConfig::default())
        .expect("transform should succeed");
    let report = build_feature_report(&table, "fixture").expect("report should build");

    let logs = capture_logs(Level::INFO, || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("single-thread runtime should build");

        rt.block_on(async {
            let source = Arc::new(InMemoryReportSource::new(report));
            let app = report_router(source);

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/report/snapshot")
                        .body(Body::empty())
                        .expect("request should build"),
                )
                .await
                .expect("snapshot request should succeed");

            assert_eq!(response.status(), StatusCode::OK);
        });
    });

    assert!(logs.contains("\"event\":\"http.snapshot.request\""));
}
