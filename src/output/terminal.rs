//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::result::{Allocation, Strategy};

/// Format an Allocation for human-readable terminal output.
pub fn format_allocation(allocation: &Allocation) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("ppi-power\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!("  {}\n\n", format_strategy(allocation.strategy)));

    output.push_str(&format!("    Gold-labeled samples (n):  {}\n", allocation.n));
    output.push_str(&format!(
        "    Unlabeled samples (N):     {}\n",
        allocation.n_unlabeled
    ));
    output.push_str(&format!(
        "    Predictions needed:        {}\n",
        allocation.total_predictions()
    ));
    output.push_str(&format!("    Total cost:                {:.2}\n", allocation.cost));
    output.push_str(&format!("    Standard error:            {:.6}\n", allocation.se));
    output.push('\n');

    output.push_str(&sep);
    output.push('\n');

    if allocation.strategy == Strategy::Classical {
        output.push_str(
            "Note: Predictions are not cheap or accurate enough to beat gold labels alone.\n",
        );
    }

    output
}

fn format_strategy(strategy: Strategy) -> String {
    match strategy {
        Strategy::Ppi => "\u{2713} Prediction-powered inference".green().bold().to_string(),
        Strategy::Classical => "\u{26A0} Classical estimation".yellow().bold().to_string(),
    }
}
