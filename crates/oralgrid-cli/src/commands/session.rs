//! The `oralgrid session` command.
//!
//! Runs an interactive session over stdin/stdout. Evaluations live in memory
//! for the lifetime of the process; `export` is the only way to keep them.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, Utc};

use oralgrid_core::catalog::{validate_catalog, Catalog};
use oralgrid_core::config::{load_config_from, OralgridConfig};
use oralgrid_core::export::{write_export, ExportLayout};
use oralgrid_core::statistics::SubjectFilter;
use oralgrid_core::store::{ClearOutcome, EvaluationStore};
use oralgrid_report::html::write_html_report;
use oralgrid_report::ResultsView;

use crate::{form, render};

pub fn execute(
    catalog: Option<PathBuf>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(path) = catalog {
        config.catalog = Some(path);
    }
    if let Some(dir) = output {
        config.output_dir = dir;
    }

    let catalog = config.load_catalog()?;
    for w in validate_catalog(&catalog) {
        match &w.category {
            Some(name) => tracing::warn!(category = %name, "catalog: {}", w.message),
            None => tracing::warn!("catalog: {}", w.message),
        }
    }
    tracing::info!(
        title = %catalog.title,
        criteria = catalog.len(),
        output_dir = %config.output_dir.display(),
        "session started"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(catalog, config, stdin.lock(), stdout.lock());
    session.run()
}

const HELP: &str = "\
Commands:
  submit              fill in and submit a new evaluation
  results [subject]   statistics per criterion, optionally for one subject
  remarks [subject]   remarks left in each evaluation
  list                submitted evaluations
  export [layout]     write all evaluations to JSON (structured or legacy)
  html [subject]      write the results page to an HTML file
  clear               delete all evaluations (run twice to confirm)
  help                show this help
  quit                leave the session";

/// One interactive session bound to an input and an output stream.
pub struct Session<R, W> {
    store: EvaluationStore,
    catalog: Catalog,
    config: OralgridConfig,
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(catalog: Catalog, config: OralgridConfig, input: R, out: W) -> Self {
        Self {
            store: EvaluationStore::with_confirm_ttl(config.confirm_ttl_secs),
            catalog,
            config,
            input,
            out,
        }
    }

    /// Read commands until `quit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.out, "{}", self.catalog.title)?;
        writeln!(
            self.out,
            "{} criteria in {} categories. Type `help` for commands.",
            self.catalog.len(),
            self.catalog.categories.len()
        )?;

        loop {
            write!(self.out, "\noralgrid> ")?;
            self.out.flush()?;
            let Some(line) = form::read_line(&mut self.input)? else {
                writeln!(self.out)?;
                break;
            };

            let line = line.trim();
            let (command, arg) = match line.split_once(char::is_whitespace) {
                Some((command, rest)) => (command, Some(rest.trim()).filter(|a| !a.is_empty())),
                None => (line, None),
            };

            match command {
                "" => {}
                "submit" | "s" => self.submit()?,
                "results" | "r" => self.results(arg)?,
                "remarks" => self.remarks(arg)?,
                "list" | "ls" => self.list()?,
                "export" => self.export(arg)?,
                "html" => self.html(arg)?,
                "clear" => self.clear()?,
                "help" | "?" => writeln!(self.out, "{HELP}")?,
                "quit" | "exit" | "q" => break,
                other => writeln!(
                    self.out,
                    "Unknown command `{other}`. Type `help` for commands."
                )?,
            }
        }

        tracing::info!(evaluations = self.store.len(), "session ended");
        Ok(())
    }

    fn submit(&mut self) -> Result<()> {
        let default = self.config.default_status.status();
        let Some(form) = form::collect(&mut self.input, &mut self.out, &self.catalog, default)?
        else {
            writeln!(self.out, "\nInput ended before the form was complete, nothing submitted.")?;
            return Ok(());
        };

        match self
            .store
            .submit(&form.evaluator, &form.subject, form.responses)
        {
            Ok(evaluation) => writeln!(
                self.out,
                "\nEvaluation of {} by {} saved ({} of {} criteria answered, {} in session).",
                evaluation.subject,
                evaluation.evaluator,
                evaluation.responses.len(),
                self.catalog.len(),
                self.store.len()
            )?,
            Err(e) => writeln!(
                self.out,
                "\nSubmission rejected: {e}. Nothing was saved."
            )?,
        }
        Ok(())
    }

    fn view(&self, subject: Option<&str>) -> ResultsView {
        self.store.with_evaluations(|evaluations| {
            ResultsView::build(
                evaluations,
                &self.catalog,
                SubjectFilter::from_option(subject),
                Local::now(),
            )
        })
    }

    fn empty(&mut self) -> Result<bool> {
        if self.store.is_empty() {
            writeln!(self.out, "No evaluation submitted yet. Use `submit` to start.")?;
            return Ok(true);
        }
        Ok(false)
    }

    fn results(&mut self, subject: Option<&str>) -> Result<()> {
        if self.empty()? {
            return Ok(());
        }
        let view = self.view(subject);
        if !view.subjects.is_empty() && subject.is_none() {
            writeln!(self.out, "Subjects: {}", view.subjects.join(", "))?;
        }
        render::print_results(&mut self.out, &view)?;
        Ok(())
    }

    fn remarks(&mut self, subject: Option<&str>) -> Result<()> {
        if self.empty()? {
            return Ok(());
        }
        let view = self.view(subject);
        render::print_remarks(&mut self.out, &view)?;
        Ok(())
    }

    fn list(&mut self) -> Result<()> {
        if self.empty()? {
            return Ok(());
        }
        let evaluations = self.store.snapshot();
        render::print_list(&mut self.out, &evaluations, self.catalog.len())?;
        Ok(())
    }

    fn export(&mut self, layout: Option<&str>) -> Result<()> {
        let mut options = self.config.export_options();
        if let Some(name) = layout {
            match name.parse::<ExportLayout>() {
                Ok(layout) => options.layout = layout,
                Err(e) => {
                    writeln!(self.out, "{e}")?;
                    return Ok(());
                }
            }
        }

        let written = self.store.with_evaluations(|evaluations| {
            write_export(
                &self.config.output_dir,
                evaluations,
                &self.catalog,
                options,
                &Local::now(),
            )
        });
        match written {
            Ok(path) => writeln!(
                self.out,
                "Exported {} evaluation(s) to {}",
                self.store.len(),
                path.display()
            )?,
            Err(e) => {
                tracing::error!("export failed: {e}");
                writeln!(self.out, "Export failed: {e}")?;
            }
        }
        Ok(())
    }

    fn html(&mut self, subject: Option<&str>) -> Result<()> {
        let view = self.view(subject);
        let path = self.config.output_dir.join(format!(
            "results_{}.html",
            view.generated_at.format("%Y%m%d_%H%M%S")
        ));
        match write_html_report(&view, &path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "results page written");
                writeln!(self.out, "Results page written to {}", path.display())?;
            }
            Err(e) => {
                tracing::error!("results page failed: {e:#}");
                writeln!(self.out, "Could not write results page: {e:#}")?;
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let now = Utc::now();
        match self.store.clear(now) {
            ClearOutcome::Pending(token) => writeln!(
                self.out,
                "This deletes all {} evaluation(s). Run `clear` again within {}s to confirm.",
                self.store.len(),
                (token.expires_at - now).num_seconds()
            )?,
            ClearOutcome::Cleared(removed) => {
                writeln!(self.out, "Deleted {removed} evaluation(s).")?
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;

    fn small_catalog() -> Catalog {
        Catalog::from_toml_str(
            r#"
[catalog]
title = "Mini grille"

[[categories]]
name = "CONTENU"
criteria = ["Sujet clair", "Exemples concrets"]

[[categories]]
name = "ORIGINALITÉ"
criteria = ["Angle personnel"]
"#,
            Path::new("mini.toml"),
        )
        .unwrap()
    }

    fn run_with(config: OralgridConfig, script: &str) -> (String, usize) {
        let input = Cursor::new(script.as_bytes().to_vec());
        let mut session = Session::new(small_catalog(), config, input, Vec::new());
        session.run().unwrap();
        let remaining = session.store.len();
        (String::from_utf8(session.out).unwrap(), remaining)
    }

    fn run(script: &str) -> (String, usize) {
        run_with(OralgridConfig::default(), script)
    }

    const ALL_SATISFIED: &str = "s\n\ns\n\ns\n\n";
    const ALL_UNSATISFIED: &str = "n\n\nn\n\nn\n\n";

    #[test]
    fn single_submission_is_fully_satisfied() {
        let script = format!("submit\nAlice\nBob\n{ALL_SATISFIED}results\nquit\n");
        let (out, stored) = run(&script);

        assert_eq!(stored, 1);
        assert!(out.contains("Evaluation of Bob by Alice saved (3 of 3 criteria answered, 1 in session)."));
        assert!(out.contains("Total evaluations: 1 | Subjects evaluated: 1 | Evaluators: 1"));
        assert!(out.contains("CONTENU (100.0% satisfied)"));
        assert!(out.contains("ORIGINALITÉ (100.0% satisfied)"));
    }

    #[test]
    fn opposite_evaluations_average_to_half() {
        let script = format!(
            "submit\nAlice\nBob\n{ALL_SATISFIED}submit\nChloé\nBob\n{ALL_UNSATISFIED}results Bob\n"
        );
        let (out, stored) = run(&script);

        assert_eq!(stored, 2);
        assert!(out.contains("Total evaluations: 2 | Subjects evaluated: 1 | Evaluators: 2"));
        assert!(out.contains("Showing subject: Bob (2 evaluation(s))"));
        assert!(out.contains("CONTENU (50.0% satisfied)"));
        assert!(out.contains("50.0%"));
    }

    #[test]
    fn rejected_submission_keeps_store_empty() {
        let script = format!("submit\n   \nBob\n{ALL_SATISFIED}list\n");
        let (out, stored) = run(&script);

        assert_eq!(stored, 0);
        assert!(out.contains("Submission rejected: evaluator name is required. Nothing was saved."));
        assert!(out.contains("No evaluation submitted yet."));
    }

    #[test]
    fn clear_requires_confirmation() {
        let script = format!("submit\nAlice\nBob\n{ALL_SATISFIED}clear\n");
        let (out, stored) = run(&script);
        assert_eq!(stored, 1);
        assert!(out.contains("Run `clear` again within"));

        let script = format!("submit\nAlice\nBob\n{ALL_SATISFIED}clear\nclear\nresults\n");
        let (out, stored) = run(&script);
        assert_eq!(stored, 0);
        assert!(out.contains("Deleted 1 evaluation(s)."));
        assert!(out.contains("No evaluation submitted yet."));
    }

    #[test]
    fn submission_cancels_pending_clear() {
        let script = format!(
            "submit\nAlice\nBob\n{ALL_SATISFIED}clear\nsubmit\nChloé\nDana\n{ALL_SATISFIED}clear\n"
        );
        let (out, stored) = run(&script);
        assert_eq!(stored, 2);
        assert_eq!(out.matches("Run `clear` again within").count(), 2);
        assert!(!out.contains("Deleted"));
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = OralgridConfig {
            output_dir: dir.path().to_path_buf(),
            ..OralgridConfig::default()
        };
        let script = format!("submit\nAlice\nBob\n{ALL_SATISFIED}export legacy\nexport bogus\n");
        let (out, _) = run_with(config, &script);

        assert!(out.contains("Exported 1 evaluation(s) to"));
        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("evaluations_"));
        assert!(files[0].ends_with(".json"));

        let content = std::fs::read_to_string(dir.path().join(&files[0])).unwrap();
        assert!(content.contains("\"evaluator\": \"Alice\""));
        assert!(content.contains("\"CONTENU_Sujet clair\": \"Satisfait\""));
    }

    #[test]
    fn html_page_written() {
        let dir = tempfile::tempdir().unwrap();
        let config = OralgridConfig {
            output_dir: dir.path().to_path_buf(),
            ..OralgridConfig::default()
        };
        let (out, _) = run_with(config, "html\n");
        assert!(out.contains("Results page written to"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn remarks_and_list() {
        let script = "submit\nAlice\nBob\ns\nannonce nette\n-\n-\nremarks\nlist\n";
        let (out, _) = run(script);
        assert!(out.contains("Bob, evaluated by Alice"));
        assert!(out.contains("- Sujet clair: annonce nette"));
        assert!(out.contains("1/3"));
    }

    #[test]
    fn unknown_command_and_eof() {
        let (out, stored) = run("dance\n");
        assert_eq!(stored, 0);
        assert!(out.contains("Unknown command `dance`"));
    }

    #[test]
    fn truncated_form_submits_nothing() {
        let (out, stored) = run("submit\nAlice\nBob\ns\n");
        assert_eq!(stored, 0);
        assert!(out.contains("nothing submitted"));
    }
}
