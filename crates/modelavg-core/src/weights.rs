//! Ensemble weights from per-solution error metrics.
//!
//! Each unique solution gets `weight = (1/nrmse) / Σ(1/nrmse)`, so lower error
//! means a larger share of the consensus and the weights sum to one.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::aggregate::{DecompositionRecord, DecompositionRow};
use crate::config::DuplicatePolicy;
use crate::error::{AggregationError, Result};

/// Fit metrics for one candidate solution, as produced by the model search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionMetrics {
    #[serde(rename = "solID")]
    pub sol_id: String,
    /// Training R². Not used for weighting, carried through to the table.
    pub rsq_train: f64,
    pub nrmse: f64,
}

impl SolutionMetrics {
    pub fn new(sol_id: impl Into<String>, rsq_train: f64, nrmse: f64) -> Self {
        Self {
            sol_id: sol_id.into(),
            rsq_train,
            nrmse,
        }
    }
}

/// One row of the weight table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRow {
    #[serde(rename = "solID")]
    pub sol_id: String,
    pub rsq_train: f64,
    pub nrmse: f64,
    pub inverse_nrmse: f64,
    pub weight: f64,
}

/// Normalized weights keyed by solution id, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    rows: Vec<WeightRow>,
    index: HashMap<String, usize>,
}

impl WeightTable {
    pub fn rows(&self) -> &[WeightRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, sol_id: &str) -> Option<&WeightRow> {
        self.index.get(sol_id).map(|&i| &self.rows[i])
    }

    /// Weight for `sol_id`, if the solution is part of the ensemble.
    pub fn weight_of(&self, sol_id: &str) -> Option<f64> {
        self.get(sol_id).map(|r| r.weight)
    }

    /// Solution with the lowest NRMSE (equivalently the highest weight).
    /// Ties resolve to the earliest row.
    pub fn best_solution(&self) -> Option<&WeightRow> {
        self.rows.iter().fold(None, |best: Option<&WeightRow>, row| match best {
            Some(b) if b.nrmse <= row.nrmse => Some(b),
            _ => Some(row),
        })
    }

    pub fn total_weight(&self) -> f64 {
        self.rows.iter().map(|r| r.weight).sum()
    }
}

/// Compute normalized inverse-NRMSE weights for a set of solutions.
///
/// Every record's `nrmse` is validated, including records later discarded as
/// duplicates. Under [`DuplicatePolicy::KeepFirst`] the first record for each
/// `solID` survives.
pub fn calculate_weights(
    solutions: &[SolutionMetrics],
    policy: DuplicatePolicy,
) -> Result<WeightTable> {
    if solutions.is_empty() {
        return Err(AggregationError::EmptyEnsemble);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(solutions.len());
    let mut unique: Vec<&SolutionMetrics> = Vec::with_capacity(solutions.len());
    for sol in solutions {
        if !sol.nrmse.is_finite() || sol.nrmse <= 0.0 {
            return Err(AggregationError::InvalidMetric {
                sol_id: sol.sol_id.clone(),
                value: sol.nrmse,
            });
        }
        if seen.insert(sol.sol_id.as_str()) {
            unique.push(sol);
            continue;
        }
        match policy {
            DuplicatePolicy::KeepFirst => {
                warn!("discarding duplicate record for solution {}", sol.sol_id);
            }
            DuplicatePolicy::Reject => {
                return Err(AggregationError::DuplicateSolution {
                    sol_id: sol.sol_id.clone(),
                });
            }
        }
    }

    let inverse_sum: f64 = unique.iter().map(|s| 1.0 / s.nrmse).sum();
    let mut rows = Vec::with_capacity(unique.len());
    let mut index = HashMap::with_capacity(unique.len());
    for (i, sol) in unique.into_iter().enumerate() {
        let inverse_nrmse = 1.0 / sol.nrmse;
        index.insert(sol.sol_id.clone(), i);
        rows.push(WeightRow {
            sol_id: sol.sol_id.clone(),
            rsq_train: sol.rsq_train,
            nrmse: sol.nrmse,
            inverse_nrmse,
            weight: inverse_nrmse / inverse_sum,
        });
    }
    debug!(
        "weighted {} unique solutions ({} records)",
        rows.len(),
        solutions.len()
    );

    Ok(WeightTable { rows, index })
}

/// Join each decomposition record with its solution's weight.
pub fn attach_weights(
    records: &[DecompositionRecord],
    table: &WeightTable,
) -> Result<Vec<DecompositionRow>> {
    records
        .iter()
        .map(|rec| {
            let weights = table.weight_of(&rec.sol_id).ok_or_else(|| {
                AggregationError::MissingWeight {
                    sol_id: rec.sol_id.clone(),
                    rn: rec.rn.clone(),
                }
            })?;
            Ok(DecompositionRow {
                rn: rec.rn.clone(),
                sol_id: rec.sol_id.clone(),
                coef: rec.coef,
                x_decomp_agg: rec.x_decomp_agg,
                weights,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sol(id: &str, nrmse: f64) -> SolutionMetrics {
        SolutionMetrics::new(id, 0.9, nrmse)
    }

    #[test]
    fn two_solutions_two_thirds_one_third() {
        let table =
            calculate_weights(&[sol("a", 0.1), sol("b", 0.2)], DuplicatePolicy::KeepFirst)
                .unwrap();
        assert!((table.weight_of("a").unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((table.weight_of("b").unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((table.get("a").unwrap().inverse_nrmse - 10.0).abs() < 1e-12);
        assert!((table.total_weight() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rsq_train_carried_through() {
        let table = calculate_weights(
            &[SolutionMetrics::new("x", 0.42, 0.3)],
            DuplicatePolicy::KeepFirst,
        )
        .unwrap();
        assert_eq!(table.rows()[0].rsq_train, 0.42);
        assert_eq!(table.rows()[0].weight, 1.0);
    }

    #[test]
    fn keep_first_discards_later_duplicates() {
        let table = calculate_weights(
            &[sol("a", 0.1), sol("b", 0.2), sol("a", 0.4)],
            DuplicatePolicy::KeepFirst,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").unwrap().nrmse, 0.1);
        assert_eq!(table.rows()[0].sol_id, "a");
        assert_eq!(table.rows()[1].sol_id, "b");
    }

    #[test]
    fn reject_policy_errors_on_duplicate() {
        let err = calculate_weights(&[sol("a", 0.1), sol("a", 0.1)], DuplicatePolicy::Reject)
            .unwrap_err();
        assert_eq!(
            err,
            AggregationError::DuplicateSolution {
                sol_id: "a".into()
            }
        );
    }

    #[test]
    fn non_positive_or_non_finite_nrmse_is_invalid() {
        for bad in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let err = calculate_weights(&[sol("a", 0.1), sol("z", bad)], DuplicatePolicy::KeepFirst)
                .unwrap_err();
            assert!(
                matches!(err, AggregationError::InvalidMetric { ref sol_id, .. } if sol_id == "z"),
                "nrmse {bad} gave {err:?}"
            );
        }
    }

    #[test]
    fn empty_ensemble_is_error() {
        assert_eq!(
            calculate_weights(&[], DuplicatePolicy::KeepFirst).unwrap_err(),
            AggregationError::EmptyEnsemble
        );
    }

    #[test]
    fn best_solution_has_lowest_nrmse() {
        let table = calculate_weights(
            &[sol("a", 0.3), sol("b", 0.05), sol("c", 0.05), sol("d", 0.2)],
            DuplicatePolicy::KeepFirst,
        )
        .unwrap();
        assert_eq!(table.best_solution().unwrap().sol_id, "b");
    }

    #[test]
    fn attach_weights_joins_and_flags_missing() {
        let table =
            calculate_weights(&[sol("a", 0.1), sol("b", 0.2)], DuplicatePolicy::KeepFirst)
                .unwrap();
        let records = vec![
            DecompositionRecord::new("TV", "a", 0.5, 100.0),
            DecompositionRecord::new("TV", "b", 0.6, 130.0),
        ];
        let rows = attach_weights(&records, &table).unwrap();
        assert_eq!(rows.len(), 2);
        assert!((rows[0].weights - 2.0 / 3.0).abs() < 1e-12);

        let orphan = vec![DecompositionRecord::new("RADIO", "zz", 0.1, 5.0)];
        assert_eq!(
            attach_weights(&orphan, &table).unwrap_err(),
            AggregationError::MissingWeight {
                sol_id: "zz".into(),
                rn: "RADIO".into()
            }
        );
    }
}
