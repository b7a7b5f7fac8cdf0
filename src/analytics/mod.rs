//! Fleet-health aggregation.
//!
//! Turns per-vehicle risk indicators from the master dataset into a
//! per-brand health summary and a cross-brand ranking. Scores are
//! `100 × (1 − mean(risk))` per subsystem, and the fleet score averages the
//! three subsystem risk means. Rounding precision is supplied by the caller
//! (summary and ranking contexts use different precisions).

use std::cmp::Ordering;

use serde::Serialize;

use crate::dataset::{DatasetAccess, Row, MASTER_DATASET};
use crate::errors::AppError;

pub const ENGINE_INDICATOR: &str = "engine_failure_imminent";
pub const BATTERY_INDICATOR: &str = "battery_issue_imminent";
pub const BRAKE_INDICATOR: &str = "brake_issue_imminent";

/// Derived health figures for one brand's fleet. Never stored.
#[derive(Debug, Clone, Serialize)]
pub struct BrandHealthSummary {
    pub fleet_health_score: f64,
    pub engine_health: f64,
    pub battery_health: f64,
    pub brake_health: f64,
    pub total_vehicles: u64,
}

/// One position in the cross-brand ranking.
#[derive(Debug, Clone, Serialize)]
pub struct RankingEntry {
    pub brand: String,
    #[serde(flatten)]
    pub summary: BrandHealthSummary,
    pub rank: usize,
}

pub struct AggregationEngine<D> {
    datasets: D,
}

impl<D: DatasetAccess> AggregationEngine<D> {
    pub fn new(datasets: D) -> Self {
        Self { datasets }
    }

    /// Compute the health summary for one brand from its master dataset.
    ///
    /// An empty dataset is an error: an undefined risk mean must never be
    /// reported as a perfect score.
    pub async fn summarize(
        &self,
        brand: &str,
        precision: u32,
    ) -> Result<BrandHealthSummary, AppError> {
        let rows = self.datasets.rows(brand, MASTER_DATASET).await?;
        if rows.is_empty() {
            return Err(AppError::DatasetCorrupt {
                dataset: MASTER_DATASET.into(),
                reason: "master dataset has no rows".into(),
            });
        }

        let engine_risk = indicator_mean(&rows, ENGINE_INDICATOR)?;
        let battery_risk = indicator_mean(&rows, BATTERY_INDICATOR)?;
        let brake_risk = indicator_mean(&rows, BRAKE_INDICATOR)?;
        let fleet_risk = (engine_risk + battery_risk + brake_risk) / 3.0;

        Ok(BrandHealthSummary {
            fleet_health_score: round(100.0 * (1.0 - fleet_risk), precision),
            engine_health: round(100.0 * (1.0 - engine_risk), precision),
            battery_health: round(100.0 * (1.0 - battery_risk), precision),
            brake_health: round(100.0 * (1.0 - brake_risk), precision),
            total_vehicles: rows.len() as u64,
        })
    }

    /// Rank every brand that has a master dataset under the root.
    ///
    /// Sorted by fleet health score descending; ties break on ascending
    /// brand identifier so the order is deterministic. Ranks are a
    /// contiguous 1..N sequence.
    pub async fn rank(&self, precision: u32) -> Result<Vec<RankingEntry>, AppError> {
        let mut summaries = Vec::new();
        for brand in self.datasets.brands().await? {
            match self.summarize(&brand, precision).await {
                Ok(summary) => summaries.push((brand, summary)),
                // A brand directory without a master dataset is not ranked.
                Err(AppError::DatasetNotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        summaries.sort_by(|a, b| {
            b.1.fleet_health_score
                .partial_cmp(&a.1.fleet_health_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        Ok(summaries
            .into_iter()
            .enumerate()
            .map(|(i, (brand, summary))| RankingEntry {
                brand,
                summary,
                rank: i + 1,
            })
            .collect())
    }
}

/// Mean of a boolean-like indicator column over all rows.
fn indicator_mean(rows: &[Row], column: &str) -> Result<f64, AppError> {
    let mut sum = 0.0;
    for row in rows {
        let value = row
            .get(column)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| AppError::DatasetCorrupt {
                dataset: MASTER_DATASET.into(),
                reason: format!("missing or non-numeric column '{}'", column),
            })?;
        sum += value;
    }
    Ok(sum / rows.len() as f64)
}

fn round(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
