//! Terminal rendering of results, remarks and the evaluation list.

use std::io::{self, Write};

use chrono::Local;
use comfy_table::{Cell, CellAlignment, Table};

use oralgrid_core::model::Evaluation;
use oralgrid_report::ResultsView;

fn right(content: impl ToString) -> Cell {
    Cell::new(content).set_alignment(CellAlignment::Right)
}

/// Summary line plus one table per category.
pub fn print_results<W: Write>(out: &mut W, view: &ResultsView) -> io::Result<()> {
    writeln!(
        out,
        "Total evaluations: {} | Subjects evaluated: {} | Evaluators: {}",
        view.summary.evaluations, view.summary.subjects, view.summary.evaluators
    )?;
    writeln!(
        out,
        "Showing {} ({} evaluation(s))",
        view.filter_label(),
        view.matched()
    )?;

    for category in &view.categories {
        writeln!(
            out,
            "\n{} ({:.1}% satisfied)",
            category.category,
            category.percent_satisfied()
        )?;

        let mut table = Table::new();
        table.set_header(vec!["Criterion", "Satisfied", "Unsatisfied", "% Satisfied"]);
        for stat in &category.criteria {
            table.add_row(vec![
                Cell::new(&stat.criterion),
                right(stat.satisfied),
                right(stat.unsatisfied),
                right(format!("{:.1}%", stat.percent_satisfied)),
            ]);
        }
        writeln!(out, "{table}")?;
    }

    Ok(())
}

/// Remarks of each filtered evaluation, grouped by category.
pub fn print_remarks<W: Write>(out: &mut W, view: &ResultsView) -> io::Result<()> {
    if view.remarks.is_empty() {
        writeln!(out, "No evaluation matches {}.", view.filter_label())?;
        return Ok(());
    }

    for entry in &view.remarks {
        writeln!(
            out,
            "\n{}, evaluated by {} ({})",
            entry.subject,
            entry.evaluator,
            entry
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
        )?;
        if entry.remarks.is_empty() {
            writeln!(out, "  (no remarks)")?;
            continue;
        }

        let mut current: Option<&str> = None;
        for remark in &entry.remarks {
            if current != Some(remark.category.as_str()) {
                writeln!(out, "  {}", remark.category)?;
                current = Some(remark.category.as_str());
            }
            writeln!(out, "    - {}: {}", remark.criterion, remark.remark)?;
        }
    }

    Ok(())
}

/// One row per stored evaluation, in submission order.
pub fn print_list<W: Write>(out: &mut W, evaluations: &[Evaluation], criteria: usize) -> io::Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["#", "Timestamp", "Subject", "Evaluator", "Answered"]);
    for (i, e) in evaluations.iter().enumerate() {
        table.add_row(vec![
            right(i + 1),
            Cell::new(
                e.timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S"),
            ),
            Cell::new(&e.subject),
            Cell::new(&e.evaluator),
            right(format!("{}/{}", e.responses.len(), criteria)),
        ]);
    }
    writeln!(out, "{table}")
}
