//! End-to-end ensemble report.
//!
//! Runs weights → join → aggregation → CPA/ROI/shares (and fit quality when
//! a fitted series is supplied) over one [`EnsembleInput`] document.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::aggregate::{
    AggregatedVariable, DecompositionRecord, SpendRow, SpendTable, WeightedEstimate,
    compute_contributions,
};
use crate::config::AggregationConfig;
use crate::error::{AggregationError, Result};
use crate::fit::{FitQuality, pseudo_r_squared};
use crate::metrics::{
    ContributionShareRow, CpaRow, RoiRow, calculate_contribution_shares_filtered, calculate_cpa,
    calculate_roi,
};
use crate::weights::{SolutionMetrics, WeightRow, attach_weights, calculate_weights};

/// Ensemble fitted values for fit-quality scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitInput {
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    pub num_hyperparameters: i64,
    pub num_betas: i64,
}

/// Everything one aggregation run consumes, as a single JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleInput {
    pub solutions: Vec<SolutionMetrics>,
    pub decomposition: Vec<DecompositionRecord>,
    #[serde(default)]
    pub spend: Vec<SpendRow>,
    /// Observation count. Falls back to the length of `fit.actual`.
    #[serde(default)]
    pub sample_size: Option<i64>,
    #[serde(default)]
    pub fit: Option<FitInput>,
}

impl EnsembleInput {
    /// Explicit sample size, else the fitted series length.
    pub fn resolved_sample_size(&self) -> Result<i64> {
        match (self.sample_size, &self.fit) {
            (Some(n), _) => Ok(n),
            (None, Some(fit)) => Ok(fit.actual.len() as i64),
            (None, None) => Err(AggregationError::InvalidSampleSize(0)),
        }
    }

    /// Fit quality for the `fit` section, if present.
    pub fn fit_quality(&self) -> Result<Option<FitQuality>> {
        let Some(fit) = &self.fit else {
            return Ok(None);
        };
        let n = self.resolved_sample_size()?;
        pseudo_r_squared(
            &fit.actual,
            &fit.predicted,
            n,
            fit.num_hyperparameters,
            fit.num_betas,
        )
        .map(Some)
    }
}

/// Parse an [`EnsembleInput`] JSON file.
pub fn load_input_from_path(path: &Path) -> std::io::Result<EnsembleInput> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str::<EnsembleInput>(&raw).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("failed to parse ensemble JSON: {e}"),
        )
    })
}

/// Every table produced for one ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleReport {
    pub sample_size: i64,
    pub ci_multiplier: f64,
    /// Lowest-NRMSE solution.
    pub best_solution: Option<String>,
    pub weights: Vec<WeightRow>,
    pub coefficients: Vec<WeightedEstimate>,
    pub contributions: Vec<AggregatedVariable>,
    pub cpa: Vec<CpaRow>,
    pub roi: Vec<RoiRow>,
    pub shares: Vec<ContributionShareRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitQuality>,
}

/// Run the full pipeline over `input`.
pub fn build_report(input: &EnsembleInput, config: &AggregationConfig) -> Result<EnsembleReport> {
    config.validate()?;
    let sample_size = input.resolved_sample_size()?;

    let weights = calculate_weights(&input.solutions, config.duplicate_policy)?;
    let rows = attach_weights(&input.decomposition, &weights)?;
    let spend = SpendTable::from_rows(&input.spend);
    let table = compute_contributions(&rows, &spend, sample_size, config)?;

    let cpa = calculate_cpa(&table.effects)?;
    let roi = calculate_roi(&table.effects);
    let shares = calculate_contribution_shares_filtered(&table.effects, config.include_base)?;
    let fit = input.fit_quality()?;

    info!(
        "report: {} solutions, {} variables, {} paid",
        weights.len(),
        table.effects.len(),
        roi.len()
    );

    Ok(EnsembleReport {
        sample_size,
        ci_multiplier: config.ci_multiplier,
        best_solution: weights.best_solution().map(|r| r.sol_id.clone()),
        weights: weights.rows().to_vec(),
        coefficients: table.coef,
        contributions: table.effects,
        cpa,
        roi,
        shares,
        fit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> EnsembleInput {
        EnsembleInput {
            solutions: vec![
                SolutionMetrics::new("s1", 0.91, 0.1),
                SolutionMetrics::new("s2", 0.88, 0.2),
            ],
            decomposition: vec![
                DecompositionRecord::new("TV", "s1", 0.4, 100.0),
                DecompositionRecord::new("TV", "s2", 0.5, 130.0),
                DecompositionRecord::new("INTERCEPT", "s1", 1.0, 500.0),
                DecompositionRecord::new("INTERCEPT", "s2", 1.0, 480.0),
            ],
            spend: vec![SpendRow {
                rn: "TV".into(),
                total_spend: 1000.0,
            }],
            sample_size: Some(100),
            fit: None,
        }
    }

    #[test]
    fn report_runs_every_stage() {
        let report = build_report(&input(), &AggregationConfig::default()).unwrap();
        assert_eq!(report.weights.len(), 2);
        assert_eq!(report.best_solution.as_deref(), Some("s1"));
        assert_eq!(report.contributions.len(), 2);
        assert_eq!(report.roi.len(), 1);
        assert_eq!(report.cpa.len(), 1);
        assert_eq!(report.shares.len(), 2);
        assert!((report.roi[0].roi_wtd_avg - 0.11).abs() < 1e-9);
        assert!(report.fit.is_none());
    }

    #[test]
    fn excluding_base_drops_intercept_share() {
        let cfg = AggregationConfig {
            include_base: false,
            ..AggregationConfig::default()
        };
        let report = build_report(&input(), &cfg).unwrap();
        assert_eq!(report.shares.len(), 1);
        assert!((report.shares[0].wtd_avg_share - 100.0).abs() < 1e-9);
        // Contributions table itself is never filtered.
        assert_eq!(report.contributions.len(), 2);
    }

    #[test]
    fn unknown_solution_in_decomposition_fails() {
        let mut bad = input();
        bad.decomposition
            .push(DecompositionRecord::new("RADIO", "s9", 0.1, 3.0));
        assert!(matches!(
            build_report(&bad, &AggregationConfig::default()),
            Err(AggregationError::MissingWeight { .. })
        ));
    }

    #[test]
    fn sample_size_falls_back_to_fit_length() {
        let mut inp = input();
        inp.sample_size = None;
        inp.fit = Some(FitInput {
            actual: (0..30).map(f64::from).collect(),
            predicted: (0..30).map(|i| f64::from(i) + 0.5).collect(),
            num_hyperparameters: 4,
            num_betas: 3,
        });
        assert_eq!(inp.resolved_sample_size().unwrap(), 30);
        let report = build_report(&inp, &AggregationConfig::default()).unwrap();
        let fit = report.fit.unwrap();
        assert_eq!(fit.degrees_of_freedom, 23);
        assert!(fit.pseudo_r2 > 0.99);
    }

    #[test]
    fn missing_sample_size_and_fit_is_error() {
        let mut inp = input();
        inp.sample_size = None;
        assert_eq!(
            build_report(&inp, &AggregationConfig::default()).unwrap_err(),
            AggregationError::InvalidSampleSize(0)
        );
    }

    #[test]
    fn json_uses_published_column_names() {
        let report = build_report(&input(), &AggregationConfig::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["weights"][0].get("solID").is_some());
        assert!(json["contributions"][0].get("Total Spend").is_some());
        assert!(json["cpa"][0].get("cpa_wtd_avg").is_some());
        assert!(json["cpa"][0].get("wtd_avg").is_some());
        assert!(json.get("fit").is_none());
    }

    #[test]
    fn input_parses_from_published_column_names() {
        let raw = r#"{
            "solutions": [{"solID": "1_2_3", "rsq_train": 0.9, "nrmse": 0.05}],
            "decomposition": [{"rn": "TV", "solID": "1_2_3", "coef": 0.3, "xDecompAgg": 42.0}],
            "spend": [{"rn": "TV", "Total Spend": 84.0}],
            "sample_size": 52
        }"#;
        let inp: EnsembleInput = serde_json::from_str(raw).unwrap();
        let report = build_report(&inp, &AggregationConfig::default()).unwrap();
        assert_eq!(report.contributions[0].wtd_avg, 42.0);
        assert!((report.roi[0].roi_wtd_avg - 0.5).abs() < 1e-12);
    }
}
