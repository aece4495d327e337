//! Weighted aggregation of per-variable effects across the solution ensemble.
//!
//! Rows are grouped by variable name (`rn`). Each group is reduced in a single
//! pass to a weighted mean and weighted standard deviation, renormalized by
//! the weights present in that group, and the mean is wrapped in a
//! normal-approximation confidence interval.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::AggregationConfig;
use crate::error::{AggregationError, Result};

// ---------------------------------------------------------------------------
// Input tables
// ---------------------------------------------------------------------------

/// One (variable, solution) decomposition entry before weights are joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionRecord {
    pub rn: String,
    #[serde(rename = "solID")]
    pub sol_id: String,
    pub coef: f64,
    #[serde(rename = "xDecompAgg")]
    pub x_decomp_agg: f64,
}

impl DecompositionRecord {
    pub fn new(
        rn: impl Into<String>,
        sol_id: impl Into<String>,
        coef: f64,
        x_decomp_agg: f64,
    ) -> Self {
        Self {
            rn: rn.into(),
            sol_id: sol_id.into(),
            coef,
            x_decomp_agg,
        }
    }
}

/// A decomposition entry with its solution's ensemble weight attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionRow {
    pub rn: String,
    #[serde(rename = "solID")]
    pub sol_id: String,
    pub coef: f64,
    #[serde(rename = "xDecompAgg")]
    pub x_decomp_agg: f64,
    pub weights: f64,
}

/// Total spend for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendRow {
    pub rn: String,
    #[serde(rename = "Total Spend")]
    pub total_spend: f64,
}

/// Spend lookup by variable. Variables without an entry have zero spend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpendTable {
    totals: HashMap<String, f64>,
}

impl SpendTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows; repeated variables are summed.
    pub fn from_rows(rows: &[SpendRow]) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.add(&row.rn, row.total_spend);
        }
        table
    }

    pub fn add(&mut self, rn: &str, amount: f64) {
        match self.totals.get_mut(rn) {
            Some(total) => {
                warn!("summing repeated spend entry for {rn}");
                *total += amount;
            }
            None => {
                self.totals.insert(rn.to_string(), amount);
            }
        }
    }

    pub fn lookup(&self, rn: &str) -> Option<f64> {
        self.totals.get(rn).copied()
    }

    /// Spend for `rn`, defaulting to zero.
    pub fn total_for(&self, rn: &str) -> f64 {
        self.lookup(rn).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

impl FromIterator<(String, f64)> for SpendTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (rn, amount) in iter {
            table.add(&rn, amount);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Weighted summary of one column for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEstimate {
    pub rn: String,
    pub wtd_avg: f64,
    pub wtd_stddev: f64,
    /// Number of solutions that contributed a row.
    pub solutions: usize,
}

/// Consensus effect for one variable with interval bounds and spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedVariable {
    pub rn: String,
    pub wtd_avg: f64,
    pub wtd_stddev: f64,
    pub ci95_lo: f64,
    pub ci95_hi: f64,
    #[serde(rename = "Total Spend")]
    pub total_spend: f64,
}

impl AggregatedVariable {
    pub fn has_spend(&self) -> bool {
        self.total_spend > 0.0
    }
}

/// Output of [`compute_contributions`], both tables sorted by `rn`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionTable {
    /// Coefficient summaries, kept for reference.
    pub coef: Vec<WeightedEstimate>,
    /// Decomposed-effect summaries; the table every derived metric reads.
    pub effects: Vec<AggregatedVariable>,
}

impl ContributionTable {
    pub fn effect(&self, rn: &str) -> Option<&AggregatedVariable> {
        self.effects.iter().find(|v| v.rn == rn)
    }

    pub fn coefficient(&self, rn: &str) -> Option<&WeightedEstimate> {
        self.coef.iter().find(|v| v.rn == rn)
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Single-pass weighted mean/variance accumulator (West's update).
///
/// Holds `Σw`, the running weighted mean and `Σw·(x − mean)²`, so the mean is
/// exact for a single observation and the variance never goes negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightedAccumulator {
    sum_weights: f64,
    mean: f64,
    m2: f64,
    count: usize,
}

impl WeightedAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, weight: f64, value: f64) {
        self.count += 1;
        if weight == 0.0 {
            return;
        }
        self.sum_weights += weight;
        let delta = value - self.mean;
        self.mean += (weight / self.sum_weights) * delta;
        self.m2 += weight * delta * (value - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn sum_weights(&self) -> f64 {
        self.sum_weights
    }

    /// Weighted mean, `None` while no positive weight has been seen.
    pub fn mean(&self) -> Option<f64> {
        (self.sum_weights > 0.0).then_some(self.mean)
    }

    /// Weighted population variance.
    pub fn variance(&self) -> Option<f64> {
        (self.sum_weights > 0.0).then(|| (self.m2 / self.sum_weights).max(0.0))
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }
}

impl FromIterator<(f64, f64)> for WeightedAccumulator {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        let mut acc = Self::new();
        for (w, x) in iter {
            acc.push(w, x);
        }
        acc
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Half-width of the interval around a weighted mean.
pub fn interval_half_width(wtd_stddev: f64, sample_size: i64, ci_multiplier: f64) -> f64 {
    ci_multiplier * wtd_stddev / (sample_size as f64).sqrt()
}

/// Aggregate weighted decomposition rows into one row per variable.
///
/// `sample_size` is the number of observations behind each solution and sets
/// the standard error `wtd_stddev / sqrt(sample_size)`.
pub fn compute_contributions(
    rows: &[DecompositionRow],
    spend: &SpendTable,
    sample_size: i64,
    config: &AggregationConfig,
) -> Result<ContributionTable> {
    if sample_size <= 0 {
        return Err(AggregationError::InvalidSampleSize(sample_size));
    }
    config.validate()?;

    let mut groups: BTreeMap<&str, (WeightedAccumulator, WeightedAccumulator)> = BTreeMap::new();
    for row in rows {
        if !row.weights.is_finite() || row.weights < 0.0 {
            return Err(AggregationError::InvalidMetric {
                sol_id: row.sol_id.clone(),
                value: row.weights,
            });
        }
        let (coef, effect) = groups.entry(row.rn.as_str()).or_default();
        coef.push(row.weights, row.coef);
        effect.push(row.weights, row.x_decomp_agg);
    }

    let mut table = ContributionTable {
        coef: Vec::with_capacity(groups.len()),
        effects: Vec::with_capacity(groups.len()),
    };
    for (rn, (coef, effect)) in groups {
        let (Some(coef_avg), Some(coef_sd), Some(wtd_avg), Some(wtd_stddev)) =
            (coef.mean(), coef.std_dev(), effect.mean(), effect.std_dev())
        else {
            return Err(AggregationError::ZeroGroupWeight { rn: rn.to_string() });
        };

        table.coef.push(WeightedEstimate {
            rn: rn.to_string(),
            wtd_avg: coef_avg,
            wtd_stddev: coef_sd,
            solutions: coef.count(),
        });

        let half = interval_half_width(wtd_stddev, sample_size, config.ci_multiplier);
        let total_spend = match spend.lookup(rn) {
            Some(s) => s,
            None => {
                debug!("no spend entry for {rn}; treating as zero");
                0.0
            }
        };
        table.effects.push(AggregatedVariable {
            rn: rn.to_string(),
            wtd_avg,
            wtd_stddev,
            ci95_lo: wtd_avg - half,
            ci95_hi: wtd_avg + half,
            total_spend,
        });
    }
    debug!(
        "aggregated {} rows into {} variables (n={sample_size}, m={})",
        rows.len(),
        table.effects.len(),
        config.ci_multiplier
    );

    Ok(table)
}
