//! HTML results page.
//!
//! Produces a self-contained HTML file with all CSS inlined and the charts
//! drawn as inline SVG.

use anyhow::Result;
use std::path::Path;

use oralgrid_core::statistics::CategoryStats;

use crate::view::ResultsView;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate the results page.
pub fn generate_html(view: &ResultsView) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>{}: results</title>\n",
        html_escape(&view.title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&view.title)));
    html.push_str(&format!(
        "<p class=\"meta\">{} evaluations | {} subjects | {} evaluators | {} | {}</p>\n",
        view.summary.evaluations,
        view.summary.subjects,
        view.summary.evaluators,
        html_escape(&view.filter_label()),
        view.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    html.push_str("</header>\n");

    if view.summary.evaluations == 0 {
        html.push_str("<p class=\"empty\">No evaluation submitted yet.</p>\n");
    }

    // Per-category tables and charts
    html.push_str("<section class=\"results\">\n");
    for category in &view.categories {
        html.push_str(&format!(
            "<h2>{} <span class=\"meta\">({:.1}% satisfied)</span></h2>\n",
            html_escape(&category.category),
            category.percent_satisfied()
        ));
        html.push_str("<table>\n");
        html.push_str("<thead><tr><th>Criterion</th><th>Satisfied</th><th>Unsatisfied</th><th>% Satisfied</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for stat in &category.criteria {
            html.push_str(&format!(
                "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{:.1}%</td></tr>\n",
                html_escape(&stat.criterion),
                stat.satisfied,
                stat.unsatisfied,
                stat.percent_satisfied,
            ));
        }
        html.push_str("</tbody></table>\n");

        if !category.criteria.is_empty() {
            html.push_str(&generate_grouped_bar_chart(category));
        }
    }
    html.push_str("</section>\n");

    // Remarks, one collapsible block per evaluation
    html.push_str("<section class=\"remarks\">\n");
    html.push_str("<h2>Remarks</h2>\n");
    for entry in &view.remarks {
        html.push_str(&format!(
            "<details>\n<summary>{}, evaluated by {} ({})</summary>\n",
            html_escape(&entry.subject),
            html_escape(&entry.evaluator),
            entry
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
        ));
        if entry.remarks.is_empty() {
            html.push_str("<p class=\"meta\">No remarks.</p>\n");
        } else {
            html.push_str("<ul>\n");
            for remark in &entry.remarks {
                html.push_str(&format!(
                    "<li><strong>{}</strong>, {}: <em>{}</em></li>\n",
                    html_escape(&remark.category),
                    html_escape(&remark.criterion),
                    html_escape(&remark.remark)
                ));
            }
            html.push_str("</ul>\n");
        }
        html.push_str("</details>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(view).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write the results page to a file.
pub fn write_html_report(view: &ResultsView, path: &Path) -> Result<()> {
    let html = generate_html(view);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// Horizontal grouped bars: satisfied and unsatisfied side by side per criterion.
fn generate_grouped_bar_chart(category: &CategoryStats) -> String {
    let bar_height = 14;
    let group_gap = 12;
    let max_width = 360;
    let padding = 10;
    let label_width = 420;
    let label_chars = 60;

    let max_count = category
        .criteria
        .iter()
        .map(|c| c.satisfied.max(c.unsatisfied))
        .max()
        .unwrap_or(0)
        .max(1);

    let group_height = bar_height * 2 + group_gap;
    let total_height = category.criteria.len() * group_height + padding * 2 + 20;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\" role=\"img\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, stat) in category.criteria.iter().enumerate() {
        let y = i * group_height + padding;
        let label: String = if stat.criterion.chars().count() > label_chars {
            let mut short: String = stat.criterion.chars().take(label_chars - 1).collect();
            short.push('…');
            short
        } else {
            stat.criterion.clone()
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\"><title>{}</title>{}</text>\n",
            label_width - 10,
            y + bar_height,
            html_escape(&stat.criterion),
            html_escape(&label)
        ));

        for (row, (count, color)) in [(stat.satisfied, "#22c55e"), (stat.unsatisfied, "#ef4444")]
            .into_iter()
            .enumerate()
        {
            let bar_y = y + row * bar_height;
            let width = (count as f64 / max_count as f64 * max_width as f64) as usize;
            svg.push_str(&format!(
                "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"3\"/>\n",
                label_width,
                bar_y,
                width,
                bar_height - 2,
                color
            ));
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>\n",
                label_width + width + 6,
                bar_y + bar_height / 2,
                count
            ));
        }
    }

    // Legend
    let legend_y = category.criteria.len() * group_height + padding + 10;
    svg.push_str(&format!(
        "  <rect x=\"{label_width}\" y=\"{legend_y}\" width=\"10\" height=\"10\" fill=\"#22c55e\"/>\n  <text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"currentColor\">Satisfied</text>\n",
        label_width + 14,
        legend_y + 9
    ));
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{legend_y}\" width=\"10\" height=\"10\" fill=\"#ef4444\"/>\n  <text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"currentColor\">Unsatisfied</text>\n",
        label_width + 100,
        label_width + 114,
        legend_y + 9
    ));

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --accent: #dbeafe; --accent-fg: #1e40af; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --accent: #1e3a8a; --accent-fg: #dbeafe; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
header h1 { background: linear-gradient(90deg, #3b82f6 0%, #1e40af 100%); color: #fff; padding: 1rem; border-radius: 10px; text-align: center; }
h2 { margin-top: 2rem; padding: 0.5rem; background: var(--accent); color: var(--accent-fg); border-radius: 5px; }
.meta { color: #6b7280; font-weight: normal; }
.empty { font-style: italic; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
td.num { text-align: right; font-variant-numeric: tabular-nums; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 0.5rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::tests::sample_evaluations;
    use chrono::Local;
    use oralgrid_core::catalog::Catalog;
    use oralgrid_core::statistics::SubjectFilter;

    fn make_view(filter: SubjectFilter) -> ResultsView {
        ResultsView::build(
            &sample_evaluations(),
            &Catalog::builtin(),
            filter,
            Local::now(),
        )
    }

    #[test]
    fn html_contains_required_elements() {
        let html = generate_html(&make_view(SubjectFilter::All));

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Grille d&#x27;évaluation de l&#x27;exposé oral"));
        assert!(html.contains("<h2>CONTENU"));
        assert!(html.contains("<h2>ORIGINALITÉ"));
        assert!(html.contains("<svg"));
        assert!(html.contains("Benoît, evaluated by Amélie"));
        assert_eq!(html.matches("<details>").count(), 3);
    }

    #[test]
    fn html_escapes_remarks() {
        let html = generate_html(&make_view(SubjectFilter::All));
        assert!(html.contains("bonne &lt;analyse&gt; &amp; synthèse"));
        assert!(!html.contains("<analyse>"));
    }

    #[test]
    fn html_filtered_view() {
        let html = generate_html(&make_view(SubjectFilter::Subject("Dana".into())));
        assert!(html.contains("subject: Dana"));
        assert!(html.contains("Dana, evaluated by Chloé"));
        assert!(!html.contains("Benoît, evaluated by"));
    }

    #[test]
    fn html_empty_store() {
        let view = ResultsView::build(&[], &Catalog::builtin(), SubjectFilter::All, Local::now());
        let html = generate_html(&view);
        assert!(html.contains("No evaluation submitted yet."));
        assert!(html.contains("0.0%"));
    }

    #[test]
    fn html_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.html");

        write_html_report(&make_view(SubjectFilter::All), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
