//! Error types surfaced by the evaluation store and the exporter.
//!
//! Catalog and config loading use `anyhow` with context instead; these enums
//! cover the failures a caller is expected to match on and show inline.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::CriterionKey;

/// A submission was rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The evaluator name is empty or whitespace.
    #[error("evaluator name is required")]
    MissingEvaluator,

    /// The evaluated subject's name is empty or whitespace.
    #[error("subject name is required")]
    MissingSubject,
}

/// The second step of a bulk clear could not be honoured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClearError {
    /// No clear was requested, or the request was cancelled by a submission.
    #[error("no clear request is pending")]
    NoPendingRequest,

    /// The confirmation does not belong to the pending request.
    #[error("confirmation token does not match the pending clear request")]
    TokenMismatch,

    /// The pending request outlived its confirmation window.
    #[error("clear request expired, request it again")]
    Expired,
}

/// Serialization, parsing, or writing of an export could not complete.
#[derive(Debug, Error)]
pub enum ExportError {
    /// serde_json refused to serialize the records.
    #[error("failed to serialize evaluations: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The input is not valid JSON or does not have the expected shape.
    #[error("failed to parse evaluations: {0}")]
    Parse(#[source] serde_json::Error),

    /// A record is JSON but not an evaluation in either export layout.
    #[error("malformed evaluation record #{index}: {reason}")]
    Malformed { index: usize, reason: String },

    /// A response refers to a criterion the catalog does not define.
    #[error("criterion {0} is not defined in the catalog")]
    UnknownCriterion(CriterionKey),

    /// Several catalog criteria map to the same flat key of the legacy layout.
    #[error("criteria {first} and {second} share the legacy key '{key}'; use the structured layout")]
    AmbiguousLegacyKey {
        key: String,
        first: CriterionKey,
        second: CriterionKey,
    },

    /// An imported response names a criterion that differs from the catalog's.
    #[error("criterion {key} is '{expected}' in the catalog but '{found}' in the export")]
    CriterionMismatch {
        key: CriterionKey,
        expected: String,
        found: String,
    },

    /// A legacy timestamp could not be read back.
    #[error("invalid timestamp '{0}'")]
    Timestamp(String),

    /// Writing the export file failed.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
