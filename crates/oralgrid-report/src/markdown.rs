//! Markdown rendering of a results view.

use crate::view::ResultsView;

/// Escape the characters that would break a Markdown table cell.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Format the results view as Markdown.
pub fn to_markdown(view: &ResultsView) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", view.title));
    md.push_str(&format!(
        "**Summary:** {} evaluations, {} subjects, {} evaluators ({})\n\n",
        view.summary.evaluations,
        view.summary.subjects,
        view.summary.evaluators,
        view.filter_label()
    ));

    for category in &view.categories {
        md.push_str(&format!(
            "## {} ({:.1}% satisfied)\n\n",
            category.category,
            category.percent_satisfied()
        ));
        md.push_str("| Criterion | Satisfied | Unsatisfied | % Satisfied |\n");
        md.push_str("|-----------|-----------|-------------|-------------|\n");
        for stat in &category.criteria {
            md.push_str(&format!(
                "| {} | {} | {} | {:.1}% |\n",
                cell(&stat.criterion),
                stat.satisfied,
                stat.unsatisfied,
                stat.percent_satisfied
            ));
        }
        md.push('\n');
    }

    let with_remarks: Vec<_> = view
        .remarks
        .iter()
        .filter(|e| !e.remarks.is_empty())
        .collect();
    if !with_remarks.is_empty() {
        md.push_str("## Remarks\n\n");
        for entry in with_remarks {
            md.push_str(&format!(
                "### {}, evaluated by {} ({})\n\n",
                entry.subject,
                entry.evaluator,
                entry
                    .timestamp
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
            ));
            for remark in &entry.remarks {
                md.push_str(&format!(
                    "- **{}** {}: *{}*\n",
                    remark.category, remark.criterion, remark.remark
                ));
            }
            md.push('\n');
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::tests::sample_evaluations;
    use chrono::Local;
    use oralgrid_core::catalog::Catalog;
    use oralgrid_core::statistics::SubjectFilter;

    #[test]
    fn markdown_tables_and_remarks() {
        let view = ResultsView::build(
            &sample_evaluations(),
            &Catalog::builtin(),
            SubjectFilter::All,
            Local::now(),
        );
        let md = to_markdown(&view);

        assert!(md.contains("**Summary:** 2 evaluations, 2 subjects, 2 evaluators"));
        assert!(md.contains("## CONTENU (50.0% satisfied)"));
        assert!(md.contains(
            "| Respect de la consigne et compréhension complète du sujet | 1 | 1 | 50.0% |"
        ));
        assert!(md.contains("## Remarks"));
        assert!(md.contains("### Benoît, evaluated by Amélie"));
        assert!(!md.contains("### Dana"));
    }

    #[test]
    fn markdown_escapes_pipes() {
        assert_eq!(cell("a | b"), "a \\| b");
    }
}
