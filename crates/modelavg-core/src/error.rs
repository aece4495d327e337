//! Error taxonomy for the aggregation engine.
//!
//! Every variant is a precondition violation on the numerical
//! well-definedness of one call. None of them are retryable: the functions
//! are deterministic, so the same input fails the same way.

use thiserror::Error;

/// Failure raised by any stage of the model-averaging pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    /// A solution's NRMSE is not positive and finite, or a joined weight is
    /// negative or not finite.
    #[error("invalid metric {value} for solution `{sol_id}`")]
    InvalidMetric { sol_id: String, value: f64 },

    /// A solution id appeared twice under the `reject` duplicate policy.
    #[error("duplicate solution `{sol_id}` in ensemble")]
    DuplicateSolution { sol_id: String },

    /// No solutions were supplied, so there is nothing to normalize.
    #[error("ensemble contains no solutions")]
    EmptyEnsemble,

    /// A decomposition row references a solution with no weight.
    #[error("no weight for solution `{sol_id}` (variable `{rn}`)")]
    MissingWeight { sol_id: String, rn: String },

    /// The observation count used for standard errors is not positive.
    #[error("invalid sample size {0} (must be > 0)")]
    InvalidSampleSize(i64),

    /// Weights within one variable group sum to zero.
    #[error("weights for variable `{rn}` sum to zero")]
    ZeroGroupWeight { rn: String },

    /// A derived ratio would divide by zero.
    #[error("division by zero computing `{field}` for `{rn}`")]
    DivisionByZero { rn: String, field: &'static str },

    /// The actual series is constant or empty, so total variance is zero.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// `sample_size - num_hyperparameters - num_betas` is not positive.
    #[error("invalid degrees of freedom {0} (must be > 0)")]
    InvalidDegreesOfFreedom(i64),

    /// Actual and predicted series differ in length.
    #[error("series length mismatch: {actual} actual vs {predicted} predicted")]
    LengthMismatch { actual: usize, predicted: usize },

    /// A configuration value is out of range or could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AggregationError>;
