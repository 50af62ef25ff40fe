//! Terminal output for plans and execution reports.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use assetsync_core::{Action, Plan, PlanEntry};
use assetsync_sync::ExecutionReport;

pub const NO_CHANGES: &str = "No changes detected. All files up-to-date.";

pub fn print_legend() {
    println!(
        "Plan legend: {} upload  {} update  {} delete",
        "+".green(),
        "~".yellow(),
        "-".red()
    );
}

/// One line per key, in key order. Updates list their drift underneath.
pub fn print_plan(plan: &Plan) {
    for (key, entry) in plan.iter() {
        let action = entry.action();
        let line = format!("{} {key}", action.marker());
        match entry {
            PlanEntry::Upload { .. } => println!("{}", line.green()),
            PlanEntry::UpdateMetadata { drift, .. } => {
                println!("{}", line.yellow());
                for d in drift {
                    println!("      {}", d.to_string().bright_black());
                }
            }
            PlanEntry::Delete { release } => {
                println!("{} {}", line.red(), format!("(release {release})").bright_black())
            }
            PlanEntry::Keep { .. } => println!("{line}"),
            PlanEntry::Skip => println!("{line} (not deployed)"),
        }
    }

    let counts = plan.counts();
    println!(
        "Plan: {} to upload, {} to update, {} to delete, {} unchanged.",
        counts.upload,
        counts.update,
        counts.delete,
        counts.keep + counts.skip
    );
}

/// `Execute? [y/N]`. Anything but `y`/`yes` declines.
pub fn confirm() -> Result<bool> {
    print!("Execute? [y/N] ");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "action")]
    action: String,
    #[tabled(rename = "ok")]
    ok: usize,
    #[tabled(rename = "failed")]
    failed: usize,
}

pub fn print_summary(report: &ExecutionReport) {
    let rows: Vec<SummaryRow> = [Action::Upload, Action::Update, Action::Delete]
        .into_iter()
        .map(|action| SummaryRow {
            action: action.to_string(),
            ok: report.succeeded(action),
            failed: report
                .failures()
                .filter(|o| o.action == action)
                .count(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for outcome in report.failures() {
        let error = outcome.error.as_deref().unwrap_or_default();
        println!("{} {}: {error}", "✗".red(), outcome.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_y_and_yes_confirm() {
        for answer in ["y\n", "Y", "yes", " YES \n"] {
            assert!(is_yes(answer), "{answer:?}");
        }
        for answer in ["", "\n", "n", "no", "yep", "ja"] {
            assert!(!is_yes(answer), "{answer:?}");
        }
    }
}
