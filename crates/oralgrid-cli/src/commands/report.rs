//! The `oralgrid report` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;

use oralgrid_core::config::load_config_from;
use oralgrid_core::export::load_export;
use oralgrid_core::statistics::SubjectFilter;
use oralgrid_report::ResultsView;

use crate::render;

pub fn execute(
    input: PathBuf,
    subject: Option<String>,
    format: String,
    output: Option<PathBuf>,
    catalog: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(path) = catalog {
        config.catalog = Some(path);
    }
    let catalog = config.load_catalog()?;

    let evaluations = load_export(&input, &catalog)
        .with_context(|| format!("failed to load evaluations from {}", input.display()))?;
    tracing::info!(
        path = %input.display(),
        evaluations = evaluations.len(),
        "evaluations loaded"
    );

    let view = ResultsView::build(
        &evaluations,
        &catalog,
        SubjectFilter::from_option(subject.as_deref()),
        Local::now(),
    );

    let content = match format.as_str() {
        "text" => {
            let mut buf = Vec::new();
            render::print_results(&mut buf, &view)?;
            render::print_remarks(&mut buf, &view)?;
            String::from_utf8(buf)?
        }
        "markdown" | "md" => oralgrid_report::markdown::to_markdown(&view),
        "json" => format!("{}\n", serde_json::to_string_pretty(&view)?),
        "html" => {
            let path = output.unwrap_or_else(|| {
                config.output_dir.join(format!(
                    "results_{}.html",
                    view.generated_at.format("%Y%m%d_%H%M%S")
                ))
            });
            oralgrid_report::html::write_html_report(&view, &path)?;
            println!("HTML report written to {}", path.display());
            return Ok(());
        }
        other => anyhow::bail!("unknown format: {other}. Use text, markdown, json, or html."),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => print!("{content}"),
    }

    Ok(())
}
