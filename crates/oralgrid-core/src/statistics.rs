//! Satisfied/unsatisfied aggregation per criterion.
//!
//! Every function here is pure over a slice of evaluations: calling it twice
//! on the same input yields the same output.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Category};
use crate::model::{CriterionKey, Evaluation, Status};

/// Restricts which evaluations take part in an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum SubjectFilter {
    /// Identity filter.
    #[default]
    All,
    /// Only evaluations whose subject equals this name exactly.
    Subject(String),
}

impl SubjectFilter {
    /// `None` and blank names mean no filtering.
    pub fn from_option(subject: Option<&str>) -> Self {
        match subject.map(str::trim) {
            Some(s) if !s.is_empty() => SubjectFilter::Subject(s.to_string()),
            _ => SubjectFilter::All,
        }
    }

    pub fn matches(&self, evaluation: &Evaluation) -> bool {
        match self {
            SubjectFilter::All => true,
            SubjectFilter::Subject(subject) => evaluation.subject == *subject,
        }
    }
}

/// Evaluations passing `filter`, in store order.
pub fn filter_evaluations<'a>(
    evaluations: &'a [Evaluation],
    filter: &SubjectFilter,
) -> Vec<&'a Evaluation> {
    evaluations.iter().filter(|e| filter.matches(e)).collect()
}

/// Counts for a single criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionStat {
    pub key: CriterionKey,
    /// Statement text of the criterion.
    pub criterion: String,
    pub satisfied: u32,
    pub unsatisfied: u32,
    /// In `0.0..=100.0`; 0 when nobody answered.
    pub percent_satisfied: f64,
}

impl CriterionStat {
    /// Number of evaluations that answered this criterion.
    pub fn answered(&self) -> u32 {
        self.satisfied + self.unsatisfied
    }
}

/// `satisfied / (satisfied + unsatisfied) * 100`, or 0 with no answers.
pub fn percent_satisfied(satisfied: u32, unsatisfied: u32) -> f64 {
    let total = satisfied + unsatisfied;
    if total == 0 {
        0.0
    } else {
        satisfied as f64 / total as f64 * 100.0
    }
}

/// Count answers for each criterion of `category`, in catalog order.
pub fn aggregate(
    evaluations: &[Evaluation],
    category: &Category,
    filter: &SubjectFilter,
) -> Vec<CriterionStat> {
    let selected = filter_evaluations(evaluations, filter);
    tracing::debug!(
        category = %category.name,
        evaluations = selected.len(),
        "aggregating category"
    );

    category
        .iter()
        .map(|criterion| {
            let key = criterion.key();
            let mut satisfied = 0u32;
            let mut unsatisfied = 0u32;
            for e in &selected {
                match e.status_of(&key) {
                    Some(Status::Satisfied) => satisfied += 1,
                    Some(Status::Unsatisfied) => unsatisfied += 1,
                    None => {}
                }
            }

            CriterionStat {
                key,
                criterion: criterion.statement.to_string(),
                satisfied,
                unsatisfied,
                percent_satisfied: percent_satisfied(satisfied, unsatisfied),
            }
        })
        .collect()
}

/// Aggregated counts for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub criteria: Vec<CriterionStat>,
}

impl CategoryStats {
    /// Category-wide percentage over all answered criteria.
    pub fn percent_satisfied(&self) -> f64 {
        let satisfied = self.criteria.iter().map(|c| c.satisfied).sum();
        let unsatisfied = self.criteria.iter().map(|c| c.unsatisfied).sum();
        percent_satisfied(satisfied, unsatisfied)
    }
}

/// [`aggregate`] over every category of the catalog.
pub fn aggregate_all(
    evaluations: &[Evaluation],
    catalog: &Catalog,
    filter: &SubjectFilter,
) -> Vec<CategoryStats> {
    catalog
        .categories
        .iter()
        .map(|category| CategoryStats {
            category: category.name.clone(),
            criteria: aggregate(evaluations, category, filter),
        })
        .collect()
}

/// Every subject that has been evaluated, without duplicates.
pub fn distinct_subjects(evaluations: &[Evaluation]) -> BTreeSet<String> {
    evaluations.iter().map(|e| e.subject.clone()).collect()
}

/// Every evaluator who submitted, without duplicates.
pub fn distinct_evaluators(evaluations: &[Evaluation]) -> BTreeSet<String> {
    evaluations.iter().map(|e| e.evaluator.clone()).collect()
}

/// Headline numbers for a results view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub evaluations: usize,
    pub subjects: usize,
    pub evaluators: usize,
}

impl SessionSummary {
    pub fn compute(evaluations: &[Evaluation]) -> Self {
        Self {
            evaluations: evaluations.len(),
            subjects: distinct_subjects(evaluations).len(),
            evaluators: distinct_evaluators(evaluations).len(),
        }
    }
}

/// A remark left on one criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkEntry {
    pub category: String,
    pub criterion: String,
    pub remark: String,
}

/// Remarks of one evaluation, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRemarks {
    pub timestamp: DateTime<Utc>,
    pub evaluator: String,
    pub subject: String,
    pub remarks: Vec<RemarkEntry>,
}

/// Non-empty remarks of each filtered evaluation, in store order.
///
/// Evaluations without any remark are still listed, with an empty `remarks`.
pub fn collect_remarks(
    evaluations: &[Evaluation],
    catalog: &Catalog,
    filter: &SubjectFilter,
) -> Vec<EvaluationRemarks> {
    filter_evaluations(evaluations, filter)
        .into_iter()
        .map(|e| EvaluationRemarks {
            timestamp: e.timestamp,
            evaluator: e.evaluator.clone(),
            subject: e.subject.clone(),
            remarks: catalog
                .criteria()
                .filter_map(|c| {
                    e.remark_of(&c.key()).map(|remark| RemarkEntry {
                        category: c.category.to_string(),
                        criterion: c.statement.to_string(),
                        remark: remark.to_string(),
                    })
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Response, Responses};

    fn evaluation(evaluator: &str, subject: &str, answers: &[(&str, usize, Status)]) -> Evaluation {
        let responses: Responses = answers
            .iter()
            .map(|(cat, idx, status)| (CriterionKey::new(*cat, *idx), Response::new(*status)))
            .collect();
        Evaluation {
            timestamp: Utc::now(),
            evaluator: evaluator.into(),
            subject: subject.into(),
            responses,
        }
    }

    fn contenu(catalog: &Catalog) -> &Category {
        catalog.category("CONTENU").unwrap()
    }

    #[test]
    fn percent_edges() {
        assert_eq!(percent_satisfied(0, 0), 0.0);
        assert_eq!(percent_satisfied(1, 0), 100.0);
        assert_eq!(percent_satisfied(1, 1), 50.0);
        assert!((percent_satisfied(1, 2) - 33.333).abs() < 0.01);
    }

    #[test]
    fn single_satisfied_answer() {
        let catalog = Catalog::builtin();
        let evals = vec![evaluation("Alice", "Bob", &[("CONTENU", 1, Status::Satisfied)])];

        let stats = aggregate(&evals, contenu(&catalog), &SubjectFilter::All);
        assert_eq!(stats.len(), 8);
        assert_eq!(stats[1].criterion, "Sujet clairement annoncé dès l'introduction");
        assert_eq!(stats[1].satisfied, 1);
        assert_eq!(stats[1].unsatisfied, 0);
        assert_eq!(stats[1].percent_satisfied, 100.0);
    }

    #[test]
    fn unanswered_criteria_are_zero_not_nan() {
        let catalog = Catalog::builtin();
        let evals = vec![evaluation("Alice", "Bob", &[("CONTENU", 1, Status::Satisfied)])];

        let stats = aggregate(&evals, contenu(&catalog), &SubjectFilter::All);
        for stat in stats.iter().filter(|s| s.key.index != 1) {
            assert_eq!(stat.answered(), 0);
            assert_eq!(stat.percent_satisfied, 0.0);
            assert!(!stat.percent_satisfied.is_nan());
        }

        let empty = aggregate(&[], contenu(&catalog), &SubjectFilter::All);
        assert!(empty.iter().all(|s| s.percent_satisfied == 0.0));
    }

    #[test]
    fn filter_by_subject() {
        let catalog = Catalog::builtin();
        let evals = vec![
            evaluation("Alice", "Bob", &[("CONTENU", 0, Status::Satisfied)]),
            evaluation("Chloé", "Bob", &[("CONTENU", 0, Status::Unsatisfied)]),
            evaluation("Alice", "Dana", &[("CONTENU", 0, Status::Unsatisfied)]),
        ];

        let bob = SubjectFilter::Subject("Bob".into());
        let stats = aggregate(&evals, contenu(&catalog), &bob);
        assert_eq!(stats[0].satisfied, 1);
        assert_eq!(stats[0].unsatisfied, 1);
        assert_eq!(stats[0].percent_satisfied, 50.0);

        let all = aggregate(&evals, contenu(&catalog), &SubjectFilter::All);
        assert_eq!(all[0].unsatisfied, 2);

        let nobody = SubjectFilter::Subject("Eve".into());
        let stats = aggregate(&evals, contenu(&catalog), &nobody);
        assert!(stats.iter().all(|s| s.answered() == 0));
    }

    #[test]
    fn aggregate_is_idempotent() {
        let catalog = Catalog::builtin();
        let evals = vec![
            evaluation("Alice", "Bob", &[("CONTENU", 0, Status::Satisfied)]),
            evaluation("Chloé", "Bob", &[("NON VERBALE", 3, Status::Unsatisfied)]),
        ];
        let first = aggregate_all(&evals, &catalog, &SubjectFilter::All);
        let second = aggregate_all(&evals, &catalog, &SubjectFilter::All);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert_eq!(first[1].criteria[3].unsatisfied, 1);
    }

    #[test]
    fn responses_outside_category_are_ignored() {
        let catalog = Catalog::builtin();
        let evals = vec![evaluation("Alice", "Bob", &[("CONTENU", 42, Status::Satisfied)])];
        let stats = aggregate(&evals, contenu(&catalog), &SubjectFilter::All);
        assert!(stats.iter().all(|s| s.answered() == 0));
    }

    #[test]
    fn distinct_listings_have_no_duplicates() {
        let evals = vec![
            evaluation("Alice", "Bob", &[]),
            evaluation("Alice", "Bob", &[]),
            evaluation("Chloé", "Bob", &[]),
            evaluation("Alice", "Dana", &[]),
        ];
        let subjects = distinct_subjects(&evals);
        assert_eq!(subjects.len(), 2);
        assert!(subjects.contains("Bob") && subjects.contains("Dana"));
        assert_eq!(distinct_evaluators(&evals).len(), 2);

        let summary = SessionSummary::compute(&evals);
        assert_eq!(
            summary,
            SessionSummary {
                evaluations: 4,
                subjects: 2,
                evaluators: 2
            }
        );
    }

    #[test]
    fn category_percentage() {
        let catalog = Catalog::builtin();
        let evals = vec![evaluation(
            "Alice",
            "Bob",
            &[
                ("ORIGINALITÉ", 0, Status::Satisfied),
                ("ORIGINALITÉ", 1, Status::Satisfied),
                ("ORIGINALITÉ", 2, Status::Unsatisfied),
                ("CONTENU", 0, Status::Unsatisfied),
            ],
        )];
        let stats = aggregate_all(&evals, &catalog, &SubjectFilter::All);
        let originality = stats.iter().find(|s| s.category == "ORIGINALITÉ").unwrap();
        assert!((originality.percent_satisfied() - 66.666).abs() < 0.01);
        assert_eq!(stats[2].percent_satisfied(), 0.0);
    }

    #[test]
    fn remarks_in_catalog_order() {
        let catalog = Catalog::builtin();
        let mut responses = Responses::new();
        responses.insert(
            CriterionKey::new("ORIGINALITÉ", 0),
            Response::new(Status::Satisfied).with_remark("très personnel"),
        );
        responses.insert(
            CriterionKey::new("CONTENU", 7),
            Response::new(Status::Unsatisfied).with_remark("a dépassé le temps"),
        );
        responses.insert(
            CriterionKey::new("CONTENU", 0),
            Response::new(Status::Satisfied),
        );
        let evals = vec![
            Evaluation {
                timestamp: Utc::now(),
                evaluator: "Alice".into(),
                subject: "Bob".into(),
                responses,
            },
            evaluation("Chloé", "Dana", &[("CONTENU", 0, Status::Satisfied)]),
        ];

        let all = collect_remarks(&evals, &catalog, &SubjectFilter::All);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].remarks.len(), 2);
        assert_eq!(all[0].remarks[0].category, "CONTENU");
        assert_eq!(all[0].remarks[0].remark, "a dépassé le temps");
        assert_eq!(all[0].remarks[1].criterion, "Angle personnel ou approche originale du sujet");
        assert!(all[1].remarks.is_empty());

        let dana = collect_remarks(&evals, &catalog, &SubjectFilter::Subject("Dana".into()));
        assert_eq!(dana.len(), 1);
        assert_eq!(dana[0].evaluator, "Chloé");
    }

    #[test]
    fn filter_from_option() {
        assert_eq!(SubjectFilter::from_option(None), SubjectFilter::All);
        assert_eq!(SubjectFilter::from_option(Some("  ")), SubjectFilter::All);
        assert_eq!(
            SubjectFilter::from_option(Some(" Bob ")),
            SubjectFilter::Subject("Bob".into())
        );
    }
}
