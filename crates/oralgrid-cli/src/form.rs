//! Line-oriented evaluation form.
//!
//! Asks for the evaluator and subject names, then walks the catalog asking a
//! status and an optional remark for every criterion.

use std::io::{BufRead, Write};

use anyhow::Result;

use oralgrid_core::catalog::Catalog;
use oralgrid_core::model::{Response, Responses, Status};

/// Raw answers of one filled form, not yet validated by the store.
#[derive(Debug)]
pub struct FormInput {
    pub evaluator: String,
    pub subject: String,
    pub responses: Responses,
}

/// One answer to a status prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Status(Status),
    Skip,
}

fn parse_answer(line: &str, default: Option<Status>) -> Option<Answer> {
    match line.trim() {
        "" => default.map(Answer::Status),
        "-" => Some(Answer::Skip),
        other => other.parse().ok().map(Answer::Status),
    }
}

/// Read one line without its terminator. `None` at end of input.
pub fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    read_line(input)
}

/// Fill the form. Returns `None` if the input ends before the last answer.
///
/// With `default` unset an empty status answer is refused, so every
/// criterion is either answered or explicitly skipped with `-`.
pub fn collect<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    catalog: &Catalog,
    default: Option<Status>,
) -> Result<Option<FormInput>> {
    let Some(evaluator) = prompt(input, out, "Evaluator name: ")? else {
        return Ok(None);
    };
    let Some(subject) = prompt(input, out, "Subject name: ")? else {
        return Ok(None);
    };

    let status_label = match default {
        Some(status) => format!("  status [s/n/-, empty = {status}]: "),
        None => "  status [s/n/-]: ".to_string(),
    };

    let mut responses = Responses::new();
    for category in &catalog.categories {
        writeln!(out, "\n== {} ==", category.name)?;
        let total = category.criteria.len();

        for criterion in category.iter() {
            writeln!(out, "[{}/{}] {}", criterion.index + 1, total, criterion.statement)?;

            let answer = loop {
                let Some(line) = prompt(input, out, &status_label)? else {
                    return Ok(None);
                };
                match parse_answer(&line, default) {
                    Some(answer) => break answer,
                    None => writeln!(
                        out,
                        "  please answer s (satisfied), n (unsatisfied) or - (skip)"
                    )?,
                }
            };

            if let Answer::Status(status) = answer {
                let Some(remark) = prompt(input, out, "  remark (optional): ")? else {
                    return Ok(None);
                };
                responses.insert(criterion.key(), Response::new(status).with_remark(remark));
            }
        }
    }

    Ok(Some(FormInput {
        evaluator,
        subject,
        responses,
    }))
}
