//! Pearson correlation over feature table columns.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::FeatureTable;

pub const DEFAULT_CORRELATION_COLUMNS: [&str; 6] = [
    "temperature",
    "pressure",
    "rolling_mean_temp",
    "rolling_std_temp",
    "time_since_last_maintenance",
    "failure",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `None` where fewer than two complete pairs exist or either
    /// side has zero variance.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

pub fn correlation_matrix(
    table: &FeatureTable,
    columns: &[&str],
) -> Result<CorrelationMatrix, CorrelationError> {
    let series = columns
        .iter()
        .map(|name| {
            table
                .column(name)
                .ok_or_else(|| CorrelationError::UnknownColumn((*name).to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let values = series
        .iter()
        .map(|a| series.iter().map(|b| pearson(a, b)).collect())
        .collect();

    Ok(CorrelationMatrix {
        columns: columns.iter().map(|name| (*name).to_string()).collect(),
        values,
    })
}

/// Pearson coefficient over the rows where both values are present.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}
