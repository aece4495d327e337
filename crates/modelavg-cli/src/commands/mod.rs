pub mod fit;
pub mod report;
pub mod weights;

use std::path::Path;

use modelavg_core::{
    AggregationConfig, AggregationError, DuplicatePolicy, EnsembleInput, load_config_from_path,
    load_input_from_path, z_for_confidence,
};
use serde::Serialize;

/// Load the ensemble document or exit with a message.
pub fn load_input(path: &str) -> EnsembleInput {
    match load_input_from_path(Path::new(path)) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Failed to read ensemble input {path}: {e}");
            std::process::exit(1);
        }
    }
}

/// Print an aggregation failure and exit. Nothing here is retryable.
pub fn fail(stage: &str, err: AggregationError) -> ! {
    eprintln!("{stage} failed: {err}");
    std::process::exit(1);
}

/// Parse a duplicate-policy flag value.
pub fn parse_duplicates(s: &str) -> DuplicatePolicy {
    match s {
        "keep-first" | "keep_first" | "first" => DuplicatePolicy::KeepFirst,
        "reject" | "error" => DuplicatePolicy::Reject,
        _ => {
            eprintln!("Unknown duplicate policy '{s}', using keep-first");
            DuplicatePolicy::KeepFirst
        }
    }
}

/// Command-line overrides layered on top of a config file or the defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigOverrides<'a> {
    pub config_path: Option<&'a str>,
    pub confidence: Option<f64>,
    pub ci_multiplier: Option<f64>,
    pub duplicates: Option<&'a str>,
    pub decimal_places: Option<usize>,
    pub exclude_base: bool,
}

/// Config file (or defaults), then flags. `--confidence` and
/// `--ci-multiplier` both set the multiplier; the explicit multiplier wins.
pub fn resolve_config(o: ConfigOverrides<'_>) -> Result<AggregationConfig, AggregationError> {
    let mut cfg = match o.config_path {
        Some(path) => load_config_from_path(Path::new(path))?,
        None => AggregationConfig::default(),
    };
    if let Some(level) = o.confidence {
        cfg.ci_multiplier = z_for_confidence(level)?;
    }
    if let Some(m) = o.ci_multiplier {
        cfg.ci_multiplier = m;
    }
    if let Some(d) = o.duplicates {
        cfg.duplicate_policy = parse_duplicates(d);
    }
    if let Some(ndp) = o.decimal_places {
        cfg.decimal_places = ndp;
    }
    if o.exclude_base {
        cfg.include_base = false;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Pretty-print any serializable value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize output: {e}");
            std::process::exit(1);
        }
    }
}

/// Write any serializable value as pretty JSON to `path`.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)
}
