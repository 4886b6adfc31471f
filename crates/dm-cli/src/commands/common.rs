//! Shared output helpers for CLI commands

use dm_core::{ActionKind, PlanAction};
use dm_sync::{PlannedSync, ReconcileSummary};
use std::fmt;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run before the process ends.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; nothing user-facing to print.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Render rows as a left-aligned table with a dashed rule under the header.
pub(crate) fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&render_line(headers.iter().copied(), &widths));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&render_line(row.iter().map(|s| s.as_str()), &widths));
        out.push('\n');
    }
    out
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
        .collect();
    line.join("  ").trim_end().to_string()
}

pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", format_table(headers, rows));
}

/// One line per planned write, followed by the counts
pub(crate) fn print_plan(planned: &PlannedSync) {
    let plan = &planned.plan;
    if plan.is_empty() {
        println!("Nothing to do: destination already mirrors the records.");
    } else {
        let rows: Vec<Vec<String>> = plan.actions().iter().map(plan_row).collect();
        print_table(&["ACTION", "KEY", "NAME", "ROW"], &rows);
        println!();
    }

    println!(
        "Plan: {} to create, {} to update, {} to delete ({} destination row(s))",
        plan.count(ActionKind::Create),
        plan.count(ActionKind::Update),
        plan.count(ActionKind::Delete),
        planned.destination_rows,
    );
    for dup in &planned.duplicates {
        println!(
            "  duplicate key '{}': row {} is used, row {} is left untouched",
            dup.key, dup.kept, dup.shadowed
        );
    }
    if !planned.unkeyed.is_empty() {
        println!(
            "  {} row(s) without a key are left untouched",
            planned.unkeyed.len()
        );
    }
}

fn plan_row(action: &PlanAction) -> Vec<String> {
    let name = match action {
        PlanAction::Create { record } | PlanAction::Update { record, .. } => {
            record.display().to_string()
        }
        PlanAction::Delete { .. } => String::new(),
    };
    vec![
        action.kind().to_string(),
        action.key().to_string(),
        name,
        action
            .row_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]
}

/// Counts of a finished sync, then each failed write
pub(crate) fn print_summary(summary: &ReconcileSummary, destination: &str) {
    println!(
        "Synced to {}: {} created, {} updated, {} deleted, {} failed",
        destination,
        summary.created,
        summary.updated,
        summary.deleted,
        summary.failed()
    );
    if summary.duplicate_keys > 0 {
        println!(
            "  {} duplicate destination key(s) were resolved to the last row",
            summary.duplicate_keys
        );
    }
    if summary.unkeyed_rows > 0 {
        println!(
            "  {} destination row(s) without a key were left untouched",
            summary.unkeyed_rows
        );
    }
    for failure in &summary.failures {
        println!(
            "  failed to {} '{}': {}",
            failure.action, failure.key, failure.message
        );
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
