//! JSON export and re-import of a session's evaluations.
//!
//! Two layouts are supported. `structured` nests responses as a list of
//! `{category, index, criterion, status, remark}` objects. `legacy` is the
//! flat layout of earlier exports, where each response is keyed by
//! `"<category>_<criterion>"` and each remark by
//! `"remark_<category>_<criterion>"`. Legacy keys are always resolved
//! against the catalog by exact match, never split on `_`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::Catalog;
use crate::error::ExportError;
use crate::model::{CriterionKey, Evaluation, Response, Responses, Status};

/// Timestamp format of the legacy layout (local time, no offset).
pub const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shape of the exported records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportLayout {
    #[default]
    Structured,
    Legacy,
}

impl fmt::Display for ExportLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportLayout::Structured => write!(f, "structured"),
            ExportLayout::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for ExportLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structured" | "json" => Ok(ExportLayout::Structured),
            "legacy" | "flat" => Ok(ExportLayout::Legacy),
            other => Err(format!("unknown export layout: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    pub layout: ExportLayout,
    /// Write every non-ASCII character as a `\uXXXX` escape.
    pub ascii_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct StructuredRecord {
    timestamp: DateTime<Utc>,
    evaluator: String,
    student: String,
    responses: Vec<StructuredResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StructuredResponse {
    category: String,
    index: usize,
    criterion: String,
    status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remark: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LegacyRecord {
    timestamp: String,
    evaluator: String,
    student: String,
    responses: Map<String, Value>,
}

/// Serialize evaluations, in store order, as pretty-printed JSON.
///
/// Fails with [`ExportError::UnknownCriterion`] if a response refers to a
/// criterion missing from `catalog`, and with
/// [`ExportError::AmbiguousLegacyKey`] if the legacy layout cannot tell two
/// answered criteria apart.
pub fn export_json(
    evaluations: &[Evaluation],
    catalog: &Catalog,
    options: ExportOptions,
) -> Result<String, ExportError> {
    for evaluation in evaluations {
        ensure_known(evaluation, catalog)?;
    }

    let json = match options.layout {
        ExportLayout::Structured => {
            let records: Vec<StructuredRecord> = evaluations
                .iter()
                .map(|e| structured_record(e, catalog))
                .collect();
            serde_json::to_string_pretty(&records)
        }
        ExportLayout::Legacy => {
            let shared = shared_legacy_keys(catalog);
            let records = evaluations
                .iter()
                .map(|e| legacy_record(e, catalog, &shared))
                .collect::<Result<Vec<LegacyRecord>, ExportError>>()?;
            serde_json::to_string_pretty(&records)
        }
    }
    .map_err(ExportError::Serialize)?;

    Ok(if options.ascii_only {
        escape_non_ascii(&json)
    } else {
        json
    })
}

fn ensure_known(evaluation: &Evaluation, catalog: &Catalog) -> Result<(), ExportError> {
    match evaluation
        .responses
        .keys()
        .find(|key| catalog.criterion(key).is_none())
    {
        Some(key) => Err(ExportError::UnknownCriterion(key.clone())),
        None => Ok(()),
    }
}

fn structured_record(evaluation: &Evaluation, catalog: &Catalog) -> StructuredRecord {
    let responses = catalog
        .criteria()
        .filter_map(|c| {
            evaluation
                .responses
                .get(&c.key())
                .map(|response| StructuredResponse {
                    category: c.category.to_string(),
                    index: c.index,
                    criterion: c.statement.to_string(),
                    status: response.status,
                    remark: response.remark.clone(),
                })
        })
        .collect();

    StructuredRecord {
        timestamp: evaluation.timestamp,
        evaluator: evaluation.evaluator.clone(),
        student: evaluation.subject.clone(),
        responses,
    }
}

/// Legacy status or remark keys produced by more than one criterion, with
/// the criteria producing them in catalog order.
fn shared_legacy_keys(catalog: &Catalog) -> HashMap<String, Vec<CriterionKey>> {
    let mut owners: HashMap<String, Vec<CriterionKey>> = HashMap::new();
    for c in catalog.criteria() {
        owners.entry(c.legacy_key()).or_default().push(c.key());
        owners.entry(c.legacy_remark_key()).or_default().push(c.key());
    }
    owners.retain(|_, keys| keys.len() > 1);
    owners
}

fn legacy_record(
    evaluation: &Evaluation,
    catalog: &Catalog,
    shared: &HashMap<String, Vec<CriterionKey>>,
) -> Result<LegacyRecord, ExportError> {
    let mut responses = Map::new();
    for c in catalog.criteria() {
        if let Some(response) = evaluation.responses.get(&c.key()) {
            let status_key = c.legacy_key();
            let remark_key = c.legacy_remark_key();
            // A shared key would be read back onto every criterion owning it.
            for key in [&status_key, &remark_key] {
                if let Some(owners) = shared.get(key) {
                    let own = c.key();
                    let other = owners
                        .iter()
                        .find(|k| **k != own)
                        .cloned()
                        .unwrap_or_else(|| own.clone());
                    return Err(ExportError::AmbiguousLegacyKey {
                        key: key.clone(),
                        first: own,
                        second: other,
                    });
                }
            }
            responses.insert(
                status_key,
                Value::String(response.status.legacy_label().to_string()),
            );
            responses.insert(
                remark_key,
                Value::String(response.remark.clone().unwrap_or_default()),
            );
        }
    }

    Ok(LegacyRecord {
        timestamp: evaluation
            .timestamp
            .with_timezone(&Local)
            .format(LEGACY_TIMESTAMP_FORMAT)
            .to_string(),
        evaluator: evaluation.evaluator.clone(),
        student: evaluation.subject.clone(),
        responses,
    })
}

/// Replace every non-ASCII character with JSON `\uXXXX` escapes.
///
/// Only valid on serde_json output, where non-ASCII text can only occur
/// inside string literals.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

/// Parse an export produced by [`export_json`] in either layout.
///
/// The layout is detected per record: a `responses` array is structured, a
/// `responses` object is legacy.
pub fn import_json(text: &str, catalog: &Catalog) -> Result<Vec<Evaluation>, ExportError> {
    let records: Vec<Value> = serde_json::from_str(text).map_err(ExportError::Parse)?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let malformed = |reason: String| ExportError::Malformed { index, reason };
            let layout = match record.get("responses") {
                Some(Value::Array(_)) => ExportLayout::Structured,
                Some(Value::Object(_)) => ExportLayout::Legacy,
                _ => return Err(malformed("missing responses".into())),
            };
            match layout {
                ExportLayout::Structured => {
                    let parsed: StructuredRecord =
                        serde_json::from_value(record).map_err(|e| malformed(e.to_string()))?;
                    from_structured(parsed, catalog)
                }
                ExportLayout::Legacy => {
                    let parsed: LegacyRecord =
                        serde_json::from_value(record).map_err(|e| malformed(e.to_string()))?;
                    from_legacy(index, parsed, catalog)
                }
            }
        })
        .collect()
}

fn from_structured(record: StructuredRecord, catalog: &Catalog) -> Result<Evaluation, ExportError> {
    let mut responses = Responses::new();
    for r in record.responses {
        let key = CriterionKey::new(r.category, r.index);
        let Some(criterion) = catalog.criterion(&key) else {
            return Err(ExportError::UnknownCriterion(key));
        };
        if criterion.statement != r.criterion {
            return Err(ExportError::CriterionMismatch {
                expected: criterion.statement.to_string(),
                found: r.criterion,
                key,
            });
        }
        let response = Response::new(r.status).with_remark(r.remark.unwrap_or_default());
        responses.insert(key, response);
    }

    Ok(Evaluation {
        timestamp: record.timestamp,
        evaluator: record.evaluator,
        subject: record.student,
        responses,
    })
}

fn from_legacy(
    index: usize,
    record: LegacyRecord,
    catalog: &Catalog,
) -> Result<Evaluation, ExportError> {
    let timestamp = NaiveDateTime::parse_from_str(&record.timestamp, LEGACY_TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .ok_or_else(|| ExportError::Timestamp(record.timestamp.clone()))?
        .with_timezone(&Utc);

    let mut known = HashSet::new();
    let mut responses = Responses::new();
    for c in catalog.criteria() {
        let status_key = c.legacy_key();
        let remark_key = c.legacy_remark_key();

        if let Some(value) = record.responses.get(&status_key) {
            let status = value
                .as_str()
                .and_then(|s| Status::from_legacy_label(s).or_else(|| s.parse().ok()))
                .ok_or_else(|| ExportError::Malformed {
                    index,
                    reason: format!("invalid status for '{status_key}': {value}"),
                })?;
            let remark = record
                .responses
                .get(&remark_key)
                .and_then(Value::as_str)
                .unwrap_or_default();
            responses.insert(c.key(), Response::new(status).with_remark(remark));
        }

        known.insert(status_key);
        known.insert(remark_key);
    }

    let unmatched = record
        .responses
        .keys()
        .filter(|k| !known.contains(*k))
        .count();
    if unmatched > 0 {
        tracing::warn!(
            record = index,
            unmatched,
            "legacy record has keys that match no catalog criterion"
        );
    }

    Ok(Evaluation {
        timestamp,
        evaluator: record.evaluator,
        subject: record.student,
        responses,
    })
}

/// Name of an export file created at `now`: `evaluations_<YYYYMMDD_HHMMSS>.json`.
pub fn export_file_name(now: &DateTime<Local>) -> String {
    format!("evaluations_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Export into `dir` under [`export_file_name`] and return the written path.
pub fn write_export(
    dir: &Path,
    evaluations: &[Evaluation],
    catalog: &Catalog,
    options: ExportOptions,
    now: &DateTime<Local>,
) -> Result<PathBuf, ExportError> {
    let json = export_json(evaluations, catalog, options)?;

    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(export_file_name(now));
    std::fs::write(&path, json).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::info!(
        path = %path.display(),
        evaluations = evaluations.len(),
        layout = %options.layout,
        "export written"
    );
    Ok(path)
}

/// Read and parse an export file.
pub fn load_export(path: &Path, catalog: &Catalog) -> Result<Vec<Evaluation>, ExportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    import_json(&content, catalog)
}
