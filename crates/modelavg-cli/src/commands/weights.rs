use modelavg_core::{WeightRow, calculate_weights};

use super::{fail, load_input, parse_duplicates, print_json};
use crate::table::Table;

pub fn run(input_path: &str, duplicates: &str, ndp: usize, format: &str) {
    let input = load_input(input_path);
    let policy = parse_duplicates(duplicates);
    let table =
        calculate_weights(&input.solutions, policy).unwrap_or_else(|e| fail("Weighting", e));

    if format == "json" {
        print_json(&table.rows());
        return;
    }
    print!("{}", weight_table(table.rows(), ndp).render());
    if let Some(best) = table.best_solution() {
        println!("Best solution (lowest NRMSE): {}", best.sol_id);
    }
}

pub fn weight_table(rows: &[WeightRow], ndp: usize) -> Table {
    let mut t = Table::new(
        "Weights",
        &["solID", "rsq_train", "nrmse", "inverse_nrmse", "weight"],
        ndp,
    );
    for r in rows {
        t.add_row(vec![
            r.sol_id.as_str().into(),
            r.rsq_train.into(),
            r.nrmse.into(),
            r.inverse_nrmse.into(),
            r.weight.into(),
        ]);
    }
    t
}
