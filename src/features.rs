//! Observation sequence to feature table transform.

use std::collections::{HashSet, VecDeque};
use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::observation::{ordering_violations, Observation};

const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_WEEK: f64 = 7.0;

pub const FEATURE_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_WINDOW_ROWS: usize = 24;

const RAW_COLUMNS: [(&str, FeatureDType); 4] = [
    ("temperature", FeatureDType::F64),
    ("pressure", FeatureDType::F64),
    ("operation_hours", FeatureDType::U64),
    ("failure", FeatureDType::Bool),
];

const ROLLING_COLUMNS: [&str; 6] = [
    "rolling_mean_temp",
    "rolling_std_temp",
    "rolling_max_temp",
    "rolling_min_temp",
    "rolling_mean_pressure",
    "rolling_std_pressure",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Replace each missing value with the nearest later value in its column.
    Backward,
    /// Leave missing values in place.
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderingPolicy {
    Unchecked,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureDType {
    F64,
    U32,
    U64,
    Bool,
}

impl FeatureDType {
    fn as_str(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Bool => "bool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub dtype: FeatureDType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub fingerprint: String,
    pub columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub window_rows: usize,
    pub lags: Vec<usize>,
    pub timezone: Tz,
    pub fill_policy: FillPolicy,
    pub ordering_policy: OrderingPolicy,
    pub schema_version: u32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window_rows: DEFAULT_WINDOW_ROWS,
            lags: vec![1, 2],
            timezone: Tz::UTC,
            fill_policy: FillPolicy::Backward,
            ordering_policy: OrderingPolicy::Unchecked,
            schema_version: FEATURE_SCHEMA_VERSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTransformReport {
    pub input_rows: u64,
    pub output_rows: u64,
    pub missing_before_fill: u64,
    pub filled_values: u64,
    pub residual_missing: u64,
    pub ordering_violations: u64,
    pub negative_maintenance_gaps: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RollingFeatures {
    pub mean_temp: Option<f64>,
    pub std_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub mean_pressure: Option<f64>,
    pub std_pressure: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagFeatures {
    pub lag: usize,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub failure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub observation: Observation,
    pub hour: u32,
    pub dayofweek: u32,
    pub is_weekend: bool,
    pub time_since_last_maintenance: f64,
    pub rolling: RollingFeatures,
    pub lags: Vec<LagFeatures>,
    pub cumulative_hours: u64,
    pub cumulative_failures: u64,
    pub sin_hour: f64,
    pub cos_hour: f64,
    pub sin_dayofweek: f64,
    pub cos_dayofweek: f64,
}

impl FeatureRow {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.observation.timestamp
    }

    pub fn lag(&self, lag: usize) -> Option<&LagFeatures> {
        self.lags.iter().find(|entry| entry.lag == lag)
    }

    /// Numeric value of a named column. The outer `None` means the name is not
    /// a column of this row; the inner one is a missing value.
    pub fn value(&self, column: &str) -> Option<Option<f64>> {
        let obs = &self.observation;
        let value = match column {
            "temperature" => Some(obs.temperature),
            "pressure" => Some(obs.pressure),
            "operation_hours" => Some(obs.operation_hours as f64),
            "failure" => Some(obs.failure_indicator()),
            "hour" => Some(self.hour as f64),
            "dayofweek" => Some(self.dayofweek as f64),
            "is_weekend" => Some(if self.is_weekend { 1.0 } else { 0.0 }),
            "time_since_last_maintenance" => Some(self.time_since_last_maintenance),
            "rolling_mean_temp" => self.rolling.mean_temp,
            "rolling_std_temp" => self.rolling.std_temp,
            "rolling_max_temp" => self.rolling.max_temp,
            "rolling_min_temp" => self.rolling.min_temp,
            "rolling_mean_pressure" => self.rolling.mean_pressure,
            "rolling_std_pressure" => self.rolling.std_pressure,
            "cumulative_hours" => Some(self.cumulative_hours as f64),
            "cumulative_failures" => Some(self.cumulative_failures as f64),
            "sin_hour" => Some(self.sin_hour),
            "cos_hour" => Some(self.cos_hour),
            "sin_dayofweek" => Some(self.sin_dayofweek),
            "cos_dayofweek" => Some(self.cos_dayofweek),
            other => {
                let (lag, field) = parse_lag_column(other)?;
                let entry = self.lag(lag)?;
                match field {
                    LagField::Temperature => entry.temperature,
                    LagField::Pressure => entry.pressure,
                    LagField::Failure => entry.failure,
                }
            }
        };
        Some(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub schema: FeatureSchema,
    pub rows: Vec<FeatureRow>,
    pub report: FeatureTransformReport,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column values in row order, or `None` if the schema has no such column.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        if !self.schema.contains(name) {
            return None;
        }
        self.rows.iter().map(|row| row.value(name)).collect()
    }

    pub fn observations(&self) -> Vec<Observation> {
        self.rows.iter().map(|row| row.observation.clone()).collect()
    }
}

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("invalid feature config: {0}")]
    InvalidConfig(String),
    #[error("timestamps out of order at row {index}: {current} follows {previous}")]
    UnorderedTimestamps {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
    #[error("schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersionMismatch { expected: u32, actual: u32 },
    #[error("schema fingerprint mismatch: expected {expected}, got {actual}")]
    SchemaFingerprintMismatch { expected: String, actual: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LagField {
    Temperature,
    Pressure,
    Failure,
}

#[derive(Debug, Clone, Copy)]
struct WindowStats {
    mean: f64,
    std: Option<f64>,
    max: f64,
    min: f64,
}

#[derive(Debug, Clone)]
struct TrailingWindow {
    values: VecDeque<f64>,
    size: usize,
}

impl TrailingWindow {
    fn new(size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(size),
            size,
        }
    }

    fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.size {
            self.values.pop_front();
        }
    }

    /// `None` until the window is full or while it holds a non-finite reading.
    fn stats(&self) -> Option<WindowStats> {
        if self.values.len() < self.size || self.values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let n = self.values.len() as f64;
        let mean = self.values.iter().sum::<f64>() / n;
        let std = if self.values.len() < 2 {
            None
        } else {
            let variance = self
                .values
                .iter()
                .map(|v| {
                    let d = *v - mean;
                    d * d
                })
                .sum::<f64>()
                / (n - 1.0);
            Some(variance.sqrt())
        };
        let max = self.values.iter().copied().fold(f64::MIN, f64::max);
        let min = self.values.iter().copied().fold(f64::MAX, f64::min);
        Some(WindowStats {
            mean,
            std,
            max,
            min,
        })
    }
}

#[derive(Debug, Clone)]
struct LagColumns {
    lag: usize,
    temperature: Vec<Option<f64>>,
    pressure: Vec<Option<f64>>,
    failure: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
struct FillableColumns {
    rolling: [Vec<Option<f64>>; 6],
    lags: Vec<LagColumns>,
}

impl FillableColumns {
    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Vec<Option<f64>>> {
        self.rolling.iter_mut().chain(
            self.lags
                .iter_mut()
                .flat_map(|lag| [&mut lag.temperature, &mut lag.pressure, &mut lag.failure]),
        )
    }

    fn missing(&self) -> u64 {
        let rolling = self.rolling.iter().map(|column| count_missing(column));
        let lags = self.lags.iter().map(|lag| {
            count_missing(&lag.temperature)
                + count_missing(&lag.pressure)
                + count_missing(&lag.failure)
        });
        rolling.chain(lags).sum()
    }
}

pub fn build_feature_schema(cfg: &FeatureConfig) -> FeatureSchema {
    let mut columns: Vec<FeatureColumn> = RAW_COLUMNS
        .iter()
        .map(|(name, dtype)| column(name, *dtype))
        .collect();

    columns.push(column("hour", FeatureDType::U32));
    columns.push(column("dayofweek", FeatureDType::U32));
    columns.push(column("is_weekend", FeatureDType::Bool));
    columns.push(column("time_since_last_maintenance", FeatureDType::F64));
    for name in ROLLING_COLUMNS {
        columns.push(column(name, FeatureDType::F64));
    }
    for lag in &cfg.lags {
        for suffix in ["temp", "pressure", "failure"] {
            columns.push(FeatureColumn {
                name: format!("lag_{lag}_{suffix}"),
                dtype: FeatureDType::F64,
            });
        }
    }
    columns.push(column("cumulative_hours", FeatureDType::U64));
    columns.push(column("cumulative_failures", FeatureDType::U64));
    for name in ["sin_hour", "cos_hour", "sin_dayofweek", "cos_dayofweek"] {
        columns.push(column(name, FeatureDType::F64));
    }

    let fingerprint = schema_fingerprint(cfg, &columns);

    debug!(
        component = "features",
        event = "features.schema.built",
        version = cfg.schema_version,
        window_rows = cfg.window_rows,
        lags = ?cfg.lags,
        column_count = columns.len(),
        fingerprint = fingerprint
    );

    FeatureSchema {
        version: cfg.schema_version,
        fingerprint,
        columns,
    }
}

/// Derives calendar, maintenance, rolling, lag, cumulative and cyclic
/// features for an ascending observation sequence.
pub fn derive_features(
    observations: &[Observation],
    cfg: &FeatureConfig,
) -> Result<FeatureTable, FeatureError> {
    validate_config(cfg)?;

    info!(
        component = "features",
        event = "features.transform.start",
        input_rows = observations.len(),
        window_rows = cfg.window_rows,
        lags = ?cfg.lags,
        timezone = %cfg.timezone.name(),
        fill_policy = ?cfg.fill_policy
    );

    let violations = check_ordering(observations, cfg.ordering_policy)?;
    let schema = build_feature_schema(cfg);

    let calendar: Vec<(u32, u32)> = observations
        .iter()
        .map(|obs| calendar_parts(obs.timestamp, cfg.timezone))
        .collect();
    let time_since_last_maintenance: Vec<f64> = observations
        .iter()
        .map(Observation::seconds_since_maintenance)
        .collect();
    let negative_maintenance_gaps = time_since_last_maintenance
        .iter()
        .filter(|gap| **gap < 0.0)
        .count() as u64;

    let temperature: Vec<f64> = observations.iter().map(|obs| obs.temperature).collect();
    let pressure: Vec<f64> = observations.iter().map(|obs| obs.pressure).collect();
    let failure: Vec<f64> = observations
        .iter()
        .map(Observation::failure_indicator)
        .collect();

    let temp_stats = rolling_stats(&temperature, cfg.window_rows);
    let pressure_stats = rolling_stats(&pressure, cfg.window_rows);
    let mut fillable = FillableColumns {
        rolling: [
            temp_stats.iter().map(|s| s.map(|s| s.mean)).collect(),
            temp_stats.iter().map(|s| s.and_then(|s| s.std)).collect(),
            temp_stats.iter().map(|s| s.map(|s| s.max)).collect(),
            temp_stats.iter().map(|s| s.map(|s| s.min)).collect(),
            pressure_stats.iter().map(|s| s.map(|s| s.mean)).collect(),
            pressure_stats.iter().map(|s| s.and_then(|s| s.std)).collect(),
        ],
        lags: cfg
            .lags
            .iter()
            .map(|lag| LagColumns {
                lag: *lag,
                temperature: lag_column(&temperature, *lag),
                pressure: lag_column(&pressure, *lag),
                failure: lag_column(&failure, *lag),
            })
            .collect(),
    };

    let cumulative_hours = running_sum(observations.iter().map(|obs| obs.operation_hours));
    let cumulative_failures = running_sum(observations.iter().map(|obs| u64::from(obs.failure)));

    let cyclic: Vec<[f64; 4]> = calendar
        .iter()
        .map(|(hour, dow)| {
            let (sin_hour, cos_hour) = cyclic_encoding(*hour as f64, HOURS_PER_DAY);
            let (sin_dow, cos_dow) = cyclic_encoding(*dow as f64, DAYS_PER_WEEK);
            [sin_hour, cos_hour, sin_dow, cos_dow]
        })
        .collect();

    let missing_before_fill = fillable.missing();
    let filled_values = match cfg.fill_policy {
        FillPolicy::Backward => fillable
            .iter_mut()
            .map(|column| backward_fill(column))
            .sum::<u64>(),
        FillPolicy::Keep => 0,
    };
    let residual_missing = missing_before_fill - filled_values;

    let rows: Vec<FeatureRow> = observations
        .iter()
        .enumerate()
        .map(|(idx, obs)| {
            let (hour, dayofweek) = calendar[idx];
            let [sin_hour, cos_hour, sin_dayofweek, cos_dayofweek] = cyclic[idx];
            let [mean_temp, std_temp, max_temp, min_temp, mean_pressure, std_pressure] =
                &fillable.rolling;
            FeatureRow {
                observation: obs.clone(),
                hour,
                dayofweek,
                is_weekend: dayofweek >= 5,
                time_since_last_maintenance: time_since_last_maintenance[idx],
                rolling: RollingFeatures {
                    mean_temp: mean_temp[idx],
                    std_temp: std_temp[idx],
                    max_temp: max_temp[idx],
                    min_temp: min_temp[idx],
                    mean_pressure: mean_pressure[idx],
                    std_pressure: std_pressure[idx],
                },
                lags: fillable
                    .lags
                    .iter()
                    .map(|columns| LagFeatures {
                        lag: columns.lag,
                        temperature: columns.temperature[idx],
                        pressure: columns.pressure[idx],
                        failure: columns.failure[idx],
                    })
                    .collect(),
                cumulative_hours: cumulative_hours[idx],
                cumulative_failures: cumulative_failures[idx],
                sin_hour,
                cos_hour,
                sin_dayofweek,
                cos_dayofweek,
            }
        })
        .collect();

    let report = FeatureTransformReport {
        input_rows: observations.len() as u64,
        output_rows: rows.len() as u64,
        missing_before_fill,
        filled_values,
        residual_missing,
        ordering_violations: violations,
        negative_maintenance_gaps,
    };

    if report.residual_missing > 0 {
        warn!(
            component = "features",
            event = "features.transform.residual_missing",
            residual_missing = report.residual_missing,
            fill_policy = ?cfg.fill_policy
        );
    }

    info!(
        component = "features",
        event = "features.transform.finish",
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        missing_before_fill = report.missing_before_fill,
        filled_values = report.filled_values,
        negative_maintenance_gaps = report.negative_maintenance_gaps
    );

    Ok(FeatureTable {
        schema,
        rows,
        report,
    })
}

pub fn assert_schema_compatible(
    expected_version: u32,
    expected_fingerprint: &str,
    actual: &FeatureSchema,
) -> Result<(), FeatureError> {
    if expected_version != actual.version {
        return Err(FeatureError::SchemaVersionMismatch {
            expected: expected_version,
            actual: actual.version,
        });
    }

    if expected_fingerprint != actual.fingerprint {
        return Err(FeatureError::SchemaFingerprintMismatch {
            expected: expected_fingerprint.to_string(),
            actual: actual.fingerprint.clone(),
        });
    }

    Ok(())
}

/// Maps a periodic value onto the unit circle.
pub fn cyclic_encoding(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

/// Backward-fills `column` in place and returns how many values were filled.
pub fn backward_fill(column: &mut [Option<f64>]) -> u64 {
    let mut next: Option<f64> = None;
    let mut filled = 0;
    for slot in column.iter_mut().rev() {
        match *slot {
            Some(value) => next = Some(value),
            None if next.is_some() => {
                *slot = next;
                filled += 1;
            }
            None => {}
        }
    }
    filled
}

fn validate_config(cfg: &FeatureConfig) -> Result<(), FeatureError> {
    if cfg.window_rows == 0 {
        return Err(FeatureError::InvalidConfig(
            "window_rows must be > 0".to_string(),
        ));
    }

    if cfg.schema_version != FEATURE_SCHEMA_VERSION {
        return Err(FeatureError::InvalidConfig(format!(
            "schema_version must equal FEATURE_SCHEMA_VERSION ({FEATURE_SCHEMA_VERSION})"
        )));
    }

    let mut seen = HashSet::new();
    for lag in &cfg.lags {
        if *lag == 0 {
            return Err(FeatureError::InvalidConfig(
                "lags entries must be > 0".to_string(),
            ));
        }
        if !seen.insert(*lag) {
            return Err(FeatureError::InvalidConfig(
                "lags entries must be unique".to_string(),
            ));
        }
    }

    Ok(())
}

fn check_ordering(
    observations: &[Observation],
    policy: OrderingPolicy,
) -> Result<u64, FeatureError> {
    let violations = ordering_violations(observations);
    let Some(&first) = violations.first() else {
        return Ok(0);
    };

    match policy {
        OrderingPolicy::Strict => Err(FeatureError::UnorderedTimestamps {
            index: first,
            previous: observations[first - 1].timestamp,
            current: observations[first].timestamp,
        }),
        OrderingPolicy::Unchecked => {
            warn!(
                component = "features",
                event = "features.transform.unordered_input",
                first_index = first,
                violations = violations.len()
            );
            Ok(violations.len() as u64)
        }
    }
}

fn calendar_parts(timestamp: DateTime<Utc>, timezone: Tz) -> (u32, u32) {
    let local = timestamp.with_timezone(&timezone);
    (local.hour(), local.weekday().num_days_from_monday())
}

fn rolling_stats(values: &[f64], window_rows: usize) -> Vec<Option<WindowStats>> {
    let mut window = TrailingWindow::new(window_rows);
    values
        .iter()
        .map(|value| {
            window.push(*value);
            window.stats()
        })
        .collect()
}

fn lag_column(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|idx| {
            idx.checked_sub(lag)
                .map(|src| values[src])
                .filter(|value| value.is_finite())
        })
        .collect()
}

fn running_sum(values: impl Iterator<Item = u64>) -> Vec<u64> {
    values
        .scan(0_u64, |total, value| {
            *total = total.saturating_add(value);
            Some(*total)
        })
        .collect()
}

fn count_missing(column: &[Option<f64>]) -> u64 {
    column.iter().filter(|value| value.is_none()).count() as u64
}

fn parse_lag_column(name: &str) -> Option<(usize, LagField)> {
    let rest = name.strip_prefix("lag_")?;
    let (lag, suffix) = rest.split_once('_')?;
    let field = match suffix {
        "temp" => LagField::Temperature,
        "pressure" => LagField::Pressure,
        "failure" => LagField::Failure,
        _ => return None,
    };
    Some((lag.parse().ok()?, field))
}

fn column(name: &str, dtype: FeatureDType) -> FeatureColumn {
    FeatureColumn {
        name: name.to_string(),
        dtype,
    }
}

fn schema_fingerprint(cfg: &FeatureConfig, columns: &[FeatureColumn]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("version:{};", cfg.schema_version));
    hasher.update(format!("window_rows:{};", cfg.window_rows));
    hasher.update(format!("timezone:{};", cfg.timezone.name()));
    hasher.update(format!("fill:{:?};", cfg.fill_policy));
    hasher.update("lags:");
    for lag in &cfg.lags {
        hasher.update(format!("{lag},"));
    }
    hasher.update(";columns:");
    for column in columns {
        hasher.update(column.name.as_bytes());
        hasher.update(format!(":{};", column.dtype.as_str()));
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_fill_leaves_tail_gaps() {
        let mut column = vec![None, Some(1.0), None, None, Some(4.0), None];
        let filled = backward_fill(&mut column);
        assert_eq!(filled, 3);
        assert_eq!(
            column,
            vec![Some(1.0), Some(1.0), Some(4.0), Some(4.0), Some(4.0), None]
        );
    }

    #[test]
    fn trailing_window_requires_full_window_and_uses_sample_std() {
        let stats = rolling_stats(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(stats[0].is_none());
        assert!(stats[1].is_none());
        let third = stats[2].expect("window full at row 2");
        assert_eq!(third.mean, 2.0);
        assert_eq!(third.std, Some(1.0));
        assert_eq!(third.max, 3.0);
        assert_eq!(third.min, 1.0);
        let fourth = stats[3].expect("window full at row 3");
        assert_eq!(fourth.mean, 3.0);
        assert_eq!(fourth.min, 2.0);
    }

    #[test]
    fn single_row_window_has_no_std() {
        let stats = rolling_stats(&[5.0, 6.0], 1);
        assert!(stats.iter().all(|s| s.is_some_and(|s| s.std.is_none())));
        assert_eq!(stats[1].map(|s| s.mean), Some(6.0));
    }

    #[test]
    fn non_finite_reading_leaves_window_undefined() {
        let stats = rolling_stats(&[f64::NAN, 1.0, 2.0, 3.0], 2);
        assert!(stats[0].is_none());
        assert!(stats[1].is_none());
        let third = stats[2].expect("window clear of NaN at row 2");
        assert_eq!(third.mean, 1.5);
        assert_eq!(third.max, 2.0);
        assert_eq!(third.min, 1.0);
    }

    #[test]
    fn lag_column_drops_non_finite_sources() {
        assert_eq!(
            lag_column(&[f64::NAN, 1.0, f64::INFINITY], 1),
            vec![None, None, Some(1.0)]
        );
    }

    #[test]
    fn lag_column_shifts_forward() {
        assert_eq!(
            lag_column(&[1.0, 2.0, 3.0], 2),
            vec![None, None, Some(1.0)]
        );
        assert_eq!(lag_column(&[1.0], 3), vec![None]);
    }

    #[test]
    fn lag_column_names_parse() {
        assert_eq!(
            parse_lag_column("lag_12_pressure"),
            Some((12, LagField::Pressure))
        );
        assert_eq!(parse_lag_column("lag_x_temp"), None);
        assert_eq!(parse_lag_column("lag_1_humidity"), None);
        assert_eq!(parse_lag_column("rolling_mean_temp"), None);
    }

    #[test]
    fn config_validation_rejects_bad_windows_and_lags() {
        let zero_window = FeatureConfig {
            window_rows: 0,
            ..FeatureConfig::default()
        };
        assert!(matches!(
            validate_config(&zero_window),
            Err(FeatureError::InvalidConfig(_))
        ));

        let duplicate_lags = FeatureConfig {
            lags: vec![1, 1],
            ..FeatureConfig::default()
        };
        assert!(matches!(
            validate_config(&duplicate_lags),
            Err(FeatureError::InvalidConfig(_))
        ));

        let zero_lag = FeatureConfig {
            lags: vec![0],
            ..FeatureConfig::default()
        };
        assert!(validate_config(&zero_lag).is_err());

        let bad_version = FeatureConfig {
            schema_version: FEATURE_SCHEMA_VERSION + 1,
            ..FeatureConfig::default()
        };
        assert!(validate_config(&bad_version).is_err());

        assert!(validate_config(&FeatureConfig::default()).is_ok());
    }
}
