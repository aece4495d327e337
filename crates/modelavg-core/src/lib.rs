//! # modelavg-core
//!
//! **One consensus answer from many candidate marketing-mix models.**
//!
//! A model search produces dozens of near-equivalent solutions, each with its
//! own decomposition of the response into per-variable effects. This crate
//! weights those solutions by fit quality and averages their effects into a
//! single table with confidence bounds, then derives CPA, ROI and
//! contribution shares from it.
//!
//! ## Quick Start
//!
//! ```
//! use modelavg_core::{
//!     AggregationConfig, DecompositionRecord, DuplicatePolicy, SolutionMetrics, SpendTable,
//!     attach_weights, calculate_roi, calculate_weights, compute_contributions,
//! };
//!
//! let solutions = [
//!     SolutionMetrics::new("s1", 0.92, 0.1),
//!     SolutionMetrics::new("s2", 0.90, 0.2),
//! ];
//! let weights = calculate_weights(&solutions, DuplicatePolicy::KeepFirst).unwrap();
//!
//! let records = [
//!     DecompositionRecord::new("TV", "s1", 0.4, 100.0),
//!     DecompositionRecord::new("TV", "s2", 0.5, 130.0),
//! ];
//! let rows = attach_weights(&records, &weights).unwrap();
//! let spend: SpendTable = [("TV".to_string(), 1000.0)].into_iter().collect();
//!
//! let table = compute_contributions(&rows, &spend, 104, &AggregationConfig::default()).unwrap();
//! let roi = calculate_roi(&table.effects);
//! assert!((roi[0].roi_wtd_avg - 0.11).abs() < 1e-9);
//! ```
//!
//! ## Pipeline
//!
//! Solutions → [`calculate_weights`] → [`attach_weights`] →
//! [`compute_contributions`] → [`calculate_cpa`] / [`calculate_roi`] /
//! [`calculate_contribution_shares`]
//!
//! [`pseudo_r_squared`] scores the ensemble's fitted series independently, and
//! [`build_report`] runs everything over one [`EnsembleInput`] document.
//!
//! Every stage is a pure function of its inputs. Division by zero, invalid
//! error metrics and missing weights are returned as [`AggregationError`]
//! values instead of leaking `inf`/`NaN` into downstream percentages.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fit;
pub mod metrics;
pub mod report;
pub mod weights;

pub use aggregate::{
    AggregatedVariable, ContributionTable, DecompositionRecord, DecompositionRow, SpendRow,
    SpendTable, WeightedAccumulator, WeightedEstimate, compute_contributions,
    interval_half_width,
};
pub use config::{
    AggregationConfig, DEFAULT_CI_MULTIPLIER, DEFAULT_DECIMAL_PLACES, DuplicatePolicy,
    load_config_from_path, z_for_confidence,
};
pub use error::{AggregationError, Result};
pub use fit::{FitQuality, adjust_r_squared, degrees_of_freedom, pseudo_r_squared};
pub use metrics::{
    BASE_VARIABLES, ContributionShareRow, CpaRow, ErrorBars, RoiRow,
    calculate_contribution_shares, calculate_contribution_shares_filtered, calculate_cpa,
    calculate_roi, is_base_variable,
};
pub use report::{EnsembleInput, EnsembleReport, FitInput, build_report, load_input_from_path};
pub use weights::{SolutionMetrics, WeightRow, WeightTable, attach_weights, calculate_weights};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
