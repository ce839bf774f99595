//! Synthetic hourly sensor series used as the default observation source.

use std::env;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;
use thiserror::Error;
use tracing::info;

use crate::observation::Observation;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub points: usize,
    pub start: DateTime<Utc>,
    pub step_seconds: i64,
    pub temperature_mean: f64,
    pub temperature_std: f64,
    pub pressure_mean: f64,
    pub pressure_std: f64,
    pub failure_probability: f64,
    pub maintenance_start: DateTime<Utc>,
    pub maintenance_interval_days: i64,
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            points: 100,
            start: Utc
                .with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
                .single()
                .expect("valid default series start"),
            step_seconds: 3_600,
            temperature_mean: 50.0,
            temperature_std: 10.0,
            pressure_mean: 30.0,
            pressure_std: 5.0,
            failure_probability: 0.5,
            maintenance_start: Utc
                .with_ymd_and_hms(2022, 12, 1, 0, 0, 0)
                .single()
                .expect("valid default maintenance start"),
            maintenance_interval_days: 3,
            seed: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SyntheticError {
    #[error("invalid synthetic config: {0}")]
    InvalidConfig(String),
    #[error("invalid {name} distribution: {message}")]
    Distribution { name: &'static str, message: String },
    #[error("timestamp overflow at row {0}")]
    TimestampOverflow(usize),
}

pub fn synthetic_config_from_env() -> SyntheticConfig {
    let mut config = SyntheticConfig::default();

    if let Ok(raw) = env::var("SENSORFEAT_SEED") {
        if let Ok(seed) = raw.trim().parse::<u64>() {
            config.seed = Some(seed);
        }
    }

    if let Ok(raw) = env::var("SENSORFEAT_POINTS") {
        if let Ok(points) = raw.trim().parse::<usize>() {
            config.points = points;
        }
    }

    config
}

/// Generates `cfg.points` observations: normally distributed temperature and
/// pressure, a row-index operating counter, coin-flip failures and a
/// maintenance date advancing by a fixed number of days per row.
pub fn generate_observations(cfg: &SyntheticConfig) -> Result<Vec<Observation>, SyntheticError> {
    validate_config(cfg)?;

    let temperature = normal("temperature", cfg.temperature_mean, cfg.temperature_std)?;
    let pressure = normal("pressure", cfg.pressure_mean, cfg.pressure_std)?;
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut observations = Vec::with_capacity(cfg.points);
    for idx in 0..cfg.points {
        let offset = idx as i64;
        let timestamp = offset
            .checked_mul(cfg.step_seconds)
            .and_then(Duration::try_seconds)
            .and_then(|step| cfg.start.checked_add_signed(step))
            .ok_or(SyntheticError::TimestampOverflow(idx))?;
        let last_maintenance = offset
            .checked_mul(cfg.maintenance_interval_days)
            .and_then(Duration::try_days)
            .and_then(|step| cfg.maintenance_start.checked_add_signed(step))
            .ok_or(SyntheticError::TimestampOverflow(idx))?;

        observations.push(Observation {
            timestamp,
            temperature: rng.sample(temperature),
            pressure: rng.sample(pressure),
            operation_hours: idx as u64,
            failure: rng.gen_bool(cfg.failure_probability),
            last_maintenance,
        });
    }

    info!(
        component = "synthetic",
        event = "synthetic.generate.finish",
        points = observations.len(),
        seed = ?cfg.seed,
        failures = observations.iter().filter(|obs| obs.failure).count()
    );

    Ok(observations)
}

fn validate_config(cfg: &SyntheticConfig) -> Result<(), SyntheticError> {
    if cfg.step_seconds <= 0 {
        return Err(SyntheticError::InvalidConfig(
            "step_seconds must be > 0".to_string(),
        ));
    }

    if cfg.maintenance_interval_days < 0 {
        return Err(SyntheticError::InvalidConfig(
            "maintenance_interval_days must be >= 0".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&cfg.failure_probability) {
        return Err(SyntheticError::InvalidConfig(
            "failure_probability must be within [0, 1]".to_string(),
        ));
    }

    Ok(())
}

fn normal(name: &'static str, mean: f64, std_dev: f64) -> Result<Normal, SyntheticError> {
    Normal::new(mean, std_dev).map_err(|err| SyntheticError::Distribution {
        name,
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(points: usize) -> SyntheticConfig {
        SyntheticConfig {
            points,
            seed: Some(7),
            ..SyntheticConfig::default()
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = generate_observations(&seeded(50)).expect("generate a");
        let b = generate_observations(&seeded(50)).expect("generate b");
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
    }

    #[test]
    fn timestamps_counters_and_maintenance_follow_schedule() {
        let rows = generate_observations(&seeded(5)).expect("generate");
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let maintenance = Utc.with_ymd_and_hms(2022, 12, 1, 0, 0, 0).unwrap();

        for (idx, row) in rows.iter().enumerate() {
            assert_eq!(row.timestamp, start + Duration::hours(idx as i64));
            assert_eq!(row.operation_hours, idx as u64);
            assert_eq!(
                row.last_maintenance,
                maintenance + Duration::days(3 * idx as i64)
            );
        }
    }

    #[test]
    fn invalid_distribution_is_rejected() {
        let cfg = SyntheticConfig {
            temperature_std: -1.0,
            ..seeded(3)
        };
        let err = generate_observations(&cfg).expect_err("negative std must fail");
        assert!(matches!(
            err,
            SyntheticError::Distribution {
                name: "temperature",
                ..
            }
        ));
    }

    #[test]
    fn invalid_step_is_rejected() {
        let cfg = SyntheticConfig {
            step_seconds: 0,
            ..seeded(3)
        };
        assert!(matches!(
            generate_observations(&cfg),
            Err(SyntheticError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_points_yields_empty_series() {
        let rows = generate_observations(&seeded(0)).expect("generate");
        assert!(rows.is_empty());
    }
}
