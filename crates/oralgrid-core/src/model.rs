//! Core data model types for oralgrid.
//!
//! An [`Evaluation`] is one evaluator's submission for one subject. Its
//! responses are keyed by [`CriterionKey`], the position of a criterion
//! inside its category, so criterion text never has to be parsed back out
//! of a concatenated string.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome recorded for a single criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Satisfied,
    Unsatisfied,
}

impl Status {
    /// Label used by the flat legacy export layout.
    pub fn legacy_label(&self) -> &'static str {
        match self {
            Status::Satisfied => "Satisfait",
            Status::Unsatisfied => "Non Satisfait",
        }
    }

    /// Inverse of [`Status::legacy_label`].
    pub fn from_legacy_label(label: &str) -> Option<Self> {
        match label {
            "Satisfait" => Some(Status::Satisfied),
            "Non Satisfait" => Some(Status::Unsatisfied),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Satisfied => write!(f, "satisfied"),
            Status::Unsatisfied => write!(f, "unsatisfied"),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "y" | "yes" | "o" | "oui" | "satisfied" | "satisfait" => Ok(Status::Satisfied),
            "n" | "no" | "non" | "unsatisfied" | "non satisfied" | "non satisfait" => {
                Ok(Status::Unsatisfied)
            }
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Identity of a criterion: its category and its position in that category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionKey {
    pub category: String,
    pub index: usize,
}

impl CriterionKey {
    pub fn new(category: impl Into<String>, index: usize) -> Self {
        Self {
            category: category.into(),
            index,
        }
    }
}

impl fmt::Display for CriterionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.category, self.index)
    }
}

/// The evaluator's answer for one criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    /// Free-text remark; never `Some` of a blank string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            remark: None,
        }
    }

    /// Attach a remark. Blank remarks are dropped.
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        let remark = remark.into();
        self.remark = if remark.trim().is_empty() {
            None
        } else {
            Some(remark)
        };
        self
    }
}

/// Responses of one evaluation, ordered by category name then index.
pub type Responses = BTreeMap<CriterionKey, Response>;

/// One evaluator's submission for one subject.
///
/// Values of this type are only created by the store (or read back from an
/// export) and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Wall-clock time of acceptance.
    pub timestamp: DateTime<Utc>,
    /// Who filled the grid.
    pub evaluator: String,
    /// Who was evaluated.
    pub subject: String,
    /// Answers keyed by criterion; missing criteria carry no data.
    pub responses: Responses,
}

impl Evaluation {
    pub fn status_of(&self, key: &CriterionKey) -> Option<Status> {
        self.responses.get(key).map(|r| r.status)
    }

    pub fn remark_of(&self, key: &CriterionKey) -> Option<&str> {
        self.responses.get(key).and_then(|r| r.remark.as_deref())
    }
}
