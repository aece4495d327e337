//! Pseudo-R² for the ensemble's fitted series.

use serde::{Deserialize, Serialize};

use crate::error::{AggregationError, Result};

/// Fit-quality indices for an actual-vs-predicted series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub avg_dep_var: f64,
    pub ssr: f64,
    pub tss: f64,
    pub pseudo_r2: f64,
    pub degrees_of_freedom: i64,
    pub adjusted_pseudo_r2: f64,
}

impl FitQuality {
    /// `(pseudo_r2, adjusted_pseudo_r2)`.
    pub fn pair(&self) -> (f64, f64) {
        (self.pseudo_r2, self.adjusted_pseudo_r2)
    }
}

/// `sample_size - num_hyperparameters - num_betas`, which must be positive.
pub fn degrees_of_freedom(
    sample_size: i64,
    num_hyperparameters: i64,
    num_betas: i64,
) -> Result<i64> {
    let dof = sample_size - num_hyperparameters - num_betas;
    if dof <= 0 {
        return Err(AggregationError::InvalidDegreesOfFreedom(dof));
    }
    Ok(dof)
}

/// Penalize a pseudo-R² for model complexity.
pub fn adjust_r_squared(
    pseudo_r2: f64,
    sample_size: i64,
    num_hyperparameters: i64,
    num_betas: i64,
) -> Result<f64> {
    let dof = degrees_of_freedom(sample_size, num_hyperparameters, num_betas)?;
    Ok(1.0 - (1.0 - pseudo_r2) * (sample_size - 1) as f64 / dof as f64)
}

/// Compute pseudo-R² and its complexity-adjusted variant.
///
/// `sample_size` is passed separately from the series because the adjustment
/// counts the observations the solutions were fitted on, which callers may
/// window differently from the plotted series.
pub fn pseudo_r_squared(
    actual: &[f64],
    predicted: &[f64],
    sample_size: i64,
    num_hyperparameters: i64,
    num_betas: i64,
) -> Result<FitQuality> {
    if actual.len() != predicted.len() {
        return Err(AggregationError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(AggregationError::DegenerateInput(
            "actual series is empty".to_string(),
        ));
    }

    let avg_dep_var = actual.iter().sum::<f64>() / actual.len() as f64;
    let ssr: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let tss: f64 = actual.iter().map(|a| (a - avg_dep_var).powi(2)).sum();
    if tss == 0.0 {
        return Err(AggregationError::DegenerateInput(
            "actual series is constant (total sum of squares is zero)".to_string(),
        ));
    }

    let pseudo_r2 = 1.0 - ssr / tss;
    let degrees_of_freedom = degrees_of_freedom(sample_size, num_hyperparameters, num_betas)?;
    let adjusted_pseudo_r2 =
        adjust_r_squared(pseudo_r2, sample_size, num_hyperparameters, num_betas)?;

    Ok(FitQuality {
        avg_dep_var,
        ssr,
        tss,
        pseudo_r2,
        degrees_of_freedom,
        adjusted_pseudo_r2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjustment_reference_value() {
        assert_eq!(degrees_of_freedom(100, 5, 10).unwrap(), 85);
        let adj = adjust_r_squared(0.8, 100, 5, 10).unwrap();
        assert!((adj - (1.0 - 0.2 * 99.0 / 85.0)).abs() < 1e-12);
        assert!((adj - 0.7671).abs() < 1e-4);
    }

    #[test]
    fn series_with_pseudo_r2_of_point_eight() {
        let actual = [1.0, 2.0, 3.0, 4.0, 5.0];
        let predicted = [2.0, 3.0, 3.0, 4.0, 5.0];
        let fit = pseudo_r_squared(&actual, &predicted, 100, 5, 10).unwrap();
        assert_eq!(fit.avg_dep_var, 3.0);
        assert_eq!(fit.tss, 10.0);
        assert_eq!(fit.ssr, 2.0);
        assert!((fit.pseudo_r2 - 0.8).abs() < 1e-12);
        assert_eq!(fit.degrees_of_freedom, 85);
        let (r2, adj) = fit.pair();
        assert!(adj < r2);
    }

    #[test]
    fn perfect_fit_is_one() {
        let actual = [3.0, 1.0, 4.0, 1.0, 5.0];
        let fit = pseudo_r_squared(&actual, &actual, 5, 0, 1).unwrap();
        assert_eq!(fit.pseudo_r2, 1.0);
        assert_eq!(fit.adjusted_pseudo_r2, 1.0);
    }

    #[test]
    fn constant_actual_is_degenerate() {
        let err = pseudo_r_squared(&[2.0; 4], &[1.0, 2.0, 3.0, 4.0], 50, 1, 1).unwrap_err();
        assert!(matches!(err, AggregationError::DegenerateInput(_)));
    }

    #[test]
    fn empty_series_is_degenerate() {
        assert!(matches!(
            pseudo_r_squared(&[], &[], 10, 1, 1),
            Err(AggregationError::DegenerateInput(_))
        ));
    }

    #[test]
    fn length_mismatch_rejected() {
        assert_eq!(
            pseudo_r_squared(&[1.0, 2.0], &[1.0], 10, 1, 1).unwrap_err(),
            AggregationError::LengthMismatch {
                actual: 2,
                predicted: 1
            }
        );
    }

    #[test]
    fn non_positive_dof_rejected() {
        assert_eq!(
            adjust_r_squared(0.5, 15, 5, 10).unwrap_err(),
            AggregationError::InvalidDegreesOfFreedom(0)
        );
        assert_eq!(
            pseudo_r_squared(&[1.0, 2.0], &[1.0, 2.0], 3, 2, 2).unwrap_err(),
            AggregationError::InvalidDegreesOfFreedom(-1)
        );
    }
}
