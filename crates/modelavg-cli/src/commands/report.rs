use log::debug;
use modelavg_core::{EnsembleReport, build_report};

use super::{ConfigOverrides, fail, load_input, print_json, resolve_config, write_json};
use crate::table::Table;

pub struct ReportCommandConfig<'a> {
    pub input_path: &'a str,
    pub config_path: Option<&'a str>,
    pub confidence: Option<f64>,
    pub ci_multiplier: Option<f64>,
    pub duplicates: Option<&'a str>,
    pub decimal_places: Option<usize>,
    pub exclude_base: bool,
    pub format: &'a str,
    pub output_path: Option<&'a str>,
}

pub fn run(cfg: ReportCommandConfig<'_>) {
    let config = resolve_config(ConfigOverrides {
        config_path: cfg.config_path,
        confidence: cfg.confidence,
        ci_multiplier: cfg.ci_multiplier,
        duplicates: cfg.duplicates,
        decimal_places: cfg.decimal_places,
        exclude_base: cfg.exclude_base,
    })
    .unwrap_or_else(|e| fail("Configuration", e));
    debug!("resolved config: {config:?}");

    let input = load_input(cfg.input_path);
    let report = build_report(&input, &config).unwrap_or_else(|e| fail("Aggregation", e));

    if cfg.format == "json" {
        print_json(&report);
    } else {
        print!("{}", render_report(&report, config.decimal_places));
    }

    if let Some(path) = cfg.output_path {
        match write_json(path, &report) {
            Ok(()) => eprintln!("Report saved to: {path}"),
            Err(e) => eprintln!("Failed to write report to {path}: {e}"),
        }
    }
}

/// Every report table, one after another.
pub fn render_report(report: &EnsembleReport, ndp: usize) -> String {
    let mut sections = Vec::new();

    sections.push(super::weights::weight_table(&report.weights, ndp).render());
    if let Some(best) = &report.best_solution {
        sections.push(format!("Best solution (lowest NRMSE): {best}\n"));
    }

    let mut coef = Table::new(
        "Coefficients",
        &["rn", "wtd_avg", "wtd_stddev", "solutions"],
        ndp,
    );
    for c in &report.coefficients {
        coef.add_row(vec![
            c.rn.as_str().into(),
            c.wtd_avg.into(),
            c.wtd_stddev.into(),
            c.solutions.into(),
        ]);
    }
    sections.push(coef.render());

    let title = format!(
        "Contributions (n={}, multiplier={:.4})",
        report.sample_size, report.ci_multiplier
    );
    let mut contrib = Table::new(
        &title,
        &["rn", "wtd_avg", "wtd_stddev", "ci95_lo", "ci95_hi", "Total Spend"],
        ndp,
    );
    for v in &report.contributions {
        contrib.add_row(vec![
            v.rn.as_str().into(),
            v.wtd_avg.into(),
            v.wtd_stddev.into(),
            v.ci95_lo.into(),
            v.ci95_hi.into(),
            v.total_spend.into(),
        ]);
    }
    sections.push(contrib.render());

    let mut cpa = Table::new(
        "Cost per Acquisition (CPA)",
        &["rn", "Total Spend", "cpa_wtd_avg", "cpa_ci95_lo", "cpa_ci95_hi"],
        ndp,
    );
    for r in &report.cpa {
        cpa.add_row(vec![
            r.variable.rn.as_str().into(),
            r.variable.total_spend.into(),
            r.cpa_wtd_avg.into(),
            r.cpa_ci95_lo.into(),
            r.cpa_ci95_hi.into(),
        ]);
    }
    sections.push(cpa.render());

    let mut roi = Table::new(
        "Return on Investment (ROI)",
        &["rn", "Total Spend", "roi_wtd_avg", "roi_ci95_lo", "roi_ci95_hi"],
        ndp,
    );
    for r in &report.roi {
        roi.add_row(vec![
            r.variable.rn.as_str().into(),
            r.variable.total_spend.into(),
            r.roi_wtd_avg.into(),
            r.roi_ci95_lo.into(),
            r.roi_ci95_hi.into(),
        ]);
    }
    sections.push(roi.render());

    let mut share = Table::new(
        "Share of Contribution (%)",
        &["rn", "wtd_avg_share", "ci95_lo_share", "ci95_hi_share"],
        ndp,
    );
    for s in &report.shares {
        share.add_row(vec![
            s.rn.as_str().into(),
            s.wtd_avg_share.into(),
            s.ci95_lo_share.into(),
            s.ci95_hi_share.into(),
        ]);
    }
    sections.push(share.render());

    if let Some(fit) = &report.fit {
        sections.push(super::fit::fit_table(fit, ndp).render());
    }

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelavg_core::{
        AggregationConfig, DecompositionRecord, EnsembleInput, SolutionMetrics, SpendRow,
    };

    fn report() -> EnsembleReport {
        let input = EnsembleInput {
            solutions: vec![
                SolutionMetrics::new("a", 0.9, 0.1),
                SolutionMetrics::new("b", 0.8, 0.2),
            ],
            decomposition: vec![
                DecompositionRecord::new("TV", "a", 0.2, 100.0),
                DecompositionRecord::new("TV", "b", 0.3, 130.0),
                DecompositionRecord::new("INTERCEPT", "a", 1.0, 400.0),
                DecompositionRecord::new("INTERCEPT", "b", 1.0, 400.0),
            ],
            spend: vec![SpendRow {
                rn: "TV".into(),
                total_spend: 1000.0,
            }],
            sample_size: Some(100),
            fit: None,
        };
        build_report(&input, &AggregationConfig::default()).unwrap()
    }

    #[test]
    fn renders_every_section() {
        let out = render_report(&report(), 2);
        for title in [
            "Weights",
            "Coefficients",
            "Contributions",
            "Cost per Acquisition",
            "Return on Investment",
            "Share of Contribution",
        ] {
            assert!(out.contains(title), "missing {title}\n{out}");
        }
        assert!(out.contains("Best solution (lowest NRMSE): a"));
        assert!(out.contains("0.11"));
        assert!(!out.contains("Fit quality"));
    }

    #[test]
    fn unpaid_variable_absent_from_roi_section() {
        let out = render_report(&report(), 2);
        let roi_section = out
            .split("Return on Investment")
            .nth(1)
            .and_then(|s| s.split("Share of Contribution").next())
            .unwrap();
        assert!(roi_section.contains("TV"));
        assert!(!roi_section.contains("INTERCEPT"));
    }
}
