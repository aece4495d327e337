use modelavg_core::FitQuality;

use super::{fail, load_input, print_json};
use crate::table::Table;

pub fn run(input_path: &str, ndp: usize, format: &str) {
    let input = load_input(input_path);
    let fit = match input.fit_quality() {
        Ok(Some(fit)) => fit,
        Ok(None) => {
            eprintln!("Input {input_path} has no `fit` section (actual/predicted series).");
            std::process::exit(1);
        }
        Err(e) => fail("Fit quality", e),
    };

    if format == "json" {
        print_json(&fit);
    } else {
        print!("{}", fit_table(&fit, ndp).render());
    }
}

pub fn fit_table(fit: &FitQuality, ndp: usize) -> Table {
    let mut t = Table::new("Fit quality", &["metric", "value"], ndp);
    t.add_row(vec!["avg_dep_var".into(), fit.avg_dep_var.into()]);
    t.add_row(vec!["ssr".into(), fit.ssr.into()]);
    t.add_row(vec!["tss".into(), fit.tss.into()]);
    t.add_row(vec!["pseudo_r2".into(), fit.pseudo_r2.into()]);
    t.add_row(vec!["degrees_of_freedom".into(), fit.degrees_of_freedom.into()]);
    t.add_row(vec!["adjusted_pseudo_r2".into(), fit.adjusted_pseudo_r2.into()]);
    t
}
