//! Business metrics derived from the aggregated effect table.
//!
//! - **CPA**: spend per unit of effect, for paid variables only.
//! - **ROI**: effect per unit of spend, for paid variables only.
//! - **Contribution share**: each interval column as a percentage of its own
//!   column total. The three share columns are normalized independently, so
//!   the lo/hi shares are shares of the bound columns, not bounds on the
//!   average share.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregatedVariable;
use crate::error::{AggregationError, Result};

/// Non-media variables that can be hidden from the contribution-share view.
pub const BASE_VARIABLES: &[&str] = &[
    "intercept", "trend", "season", "holiday", "monthly", "weekday",
];

/// Row label used when a column total, rather than a single row, is zero.
pub const COLUMN_TOTAL: &str = "(column total)";

/// True when `rn` names a base (non-media) variable. Case-insensitive.
pub fn is_base_variable(rn: &str) -> bool {
    BASE_VARIABLES.iter().any(|b| b.eq_ignore_ascii_case(rn))
}

/// Asymmetric error-bar lengths around a midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorBars {
    pub lower: f64,
    pub upper: f64,
}

impl ErrorBars {
    pub fn around(mid: f64, lo: f64, hi: f64) -> Self {
        Self {
            lower: (mid - lo).abs(),
            upper: (hi - mid).abs(),
        }
    }
}

// ---------------------------------------------------------------------------
// CPA
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpaRow {
    #[serde(flatten)]
    pub variable: AggregatedVariable,
    pub cpa_wtd_avg: f64,
    pub cpa_ci95_lo: f64,
    pub cpa_ci95_hi: f64,
}

impl CpaRow {
    pub fn error_bars(&self) -> ErrorBars {
        ErrorBars::around(self.cpa_wtd_avg, self.cpa_ci95_lo, self.cpa_ci95_hi)
    }
}

fn spend_over(v: &AggregatedVariable, denom: f64, field: &'static str) -> Result<f64> {
    if denom == 0.0 {
        return Err(AggregationError::DivisionByZero {
            rn: v.rn.clone(),
            field,
        });
    }
    Ok(v.total_spend / denom)
}

/// Cost per acquisition for every variable with positive spend.
///
/// Rows with zero spend are excluded, not zero-filled. A zero effect or
/// bound on a paid variable is an error rather than an infinite CPA.
pub fn calculate_cpa(table: &[AggregatedVariable]) -> Result<Vec<CpaRow>> {
    let mut out = Vec::new();
    for v in table {
        if !v.has_spend() {
            debug!("cpa: skipping {} (spend {})", v.rn, v.total_spend);
            continue;
        }
        out.push(CpaRow {
            cpa_wtd_avg: spend_over(v, v.wtd_avg, "cpa_wtd_avg")?,
            cpa_ci95_lo: spend_over(v, v.ci95_lo, "cpa_ci95_lo")?,
            cpa_ci95_hi: spend_over(v, v.ci95_hi, "cpa_ci95_hi")?,
            variable: v.clone(),
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// ROI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiRow {
    #[serde(flatten)]
    pub variable: AggregatedVariable,
    pub roi_wtd_avg: f64,
    pub roi_ci95_lo: f64,
    pub roi_ci95_hi: f64,
}

impl RoiRow {
    pub fn error_bars(&self) -> ErrorBars {
        ErrorBars::around(self.roi_wtd_avg, self.roi_ci95_lo, self.roi_ci95_hi)
    }
}

/// Return on investment for every variable with positive spend.
pub fn calculate_roi(table: &[AggregatedVariable]) -> Vec<RoiRow> {
    table
        .iter()
        .filter(|v| {
            let keep = v.has_spend();
            if !keep {
                debug!("roi: skipping {} (spend {})", v.rn, v.total_spend);
            }
            keep
        })
        .map(|v| RoiRow {
            roi_wtd_avg: v.wtd_avg / v.total_spend,
            roi_ci95_lo: v.ci95_lo / v.total_spend,
            roi_ci95_hi: v.ci95_hi / v.total_spend,
            variable: v.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Contribution share
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionShareRow {
    pub rn: String,
    pub wtd_avg_share: f64,
    pub ci95_lo_share: f64,
    pub ci95_hi_share: f64,
}

impl ContributionShareRow {
    pub fn error_bars(&self) -> ErrorBars {
        ErrorBars::around(self.wtd_avg_share, self.ci95_lo_share, self.ci95_hi_share)
    }
}

fn nonzero_total(total: f64, field: &'static str) -> Result<f64> {
    if total == 0.0 {
        return Err(AggregationError::DivisionByZero {
            rn: COLUMN_TOTAL.to_string(),
            field,
        });
    }
    Ok(total)
}

/// Percentage share of each variable, per column, over the whole table.
pub fn calculate_contribution_shares(
    table: &[AggregatedVariable],
) -> Result<Vec<ContributionShareRow>> {
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let total_avg = nonzero_total(table.iter().map(|v| v.wtd_avg).sum(), "wtd_avg_share")?;
    let total_lo = nonzero_total(table.iter().map(|v| v.ci95_lo).sum(), "ci95_lo_share")?;
    let total_hi = nonzero_total(table.iter().map(|v| v.ci95_hi).sum(), "ci95_hi_share")?;

    Ok(table
        .iter()
        .map(|v| ContributionShareRow {
            rn: v.rn.clone(),
            wtd_avg_share: v.wtd_avg / total_avg * 100.0,
            ci95_lo_share: v.ci95_lo / total_lo * 100.0,
            ci95_hi_share: v.ci95_hi / total_hi * 100.0,
        })
        .collect())
}

/// Like [`calculate_contribution_shares`], optionally dropping base
/// variables before the column totals are taken.
pub fn calculate_contribution_shares_filtered(
    table: &[AggregatedVariable],
    include_base: bool,
) -> Result<Vec<ContributionShareRow>> {
    if include_base {
        return calculate_contribution_shares(table);
    }
    let media: Vec<AggregatedVariable> = table
        .iter()
        .filter(|v| !is_base_variable(&v.rn))
        .cloned()
        .collect();
    calculate_contribution_shares(&media)
}
