//! Everything a results page shows, computed once from the store contents.

use chrono::{DateTime, Local};
use serde::Serialize;

use oralgrid_core::catalog::Catalog;
use oralgrid_core::model::Evaluation;
use oralgrid_core::statistics::{
    aggregate_all, collect_remarks, distinct_subjects, CategoryStats, EvaluationRemarks,
    SessionSummary, SubjectFilter,
};

/// Aggregated results, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    /// Catalog title.
    pub title: String,
    pub generated_at: DateTime<Local>,
    /// Totals over every evaluation, regardless of `filter`.
    pub summary: SessionSummary,
    /// All evaluated subjects, sorted.
    pub subjects: Vec<String>,
    pub filter: SubjectFilter,
    /// Per-category statistics over the filtered evaluations.
    pub categories: Vec<CategoryStats>,
    /// One entry per filtered evaluation, in submission order.
    pub remarks: Vec<EvaluationRemarks>,
}

impl ResultsView {
    pub fn build(
        evaluations: &[Evaluation],
        catalog: &Catalog,
        filter: SubjectFilter,
        generated_at: DateTime<Local>,
    ) -> Self {
        Self {
            title: catalog.title.clone(),
            generated_at,
            summary: SessionSummary::compute(evaluations),
            subjects: distinct_subjects(evaluations).into_iter().collect(),
            categories: aggregate_all(evaluations, catalog, &filter),
            remarks: collect_remarks(evaluations, catalog, &filter),
            filter,
        }
    }

    /// Number of evaluations that passed the filter.
    pub fn matched(&self) -> usize {
        self.remarks.len()
    }

    /// Human-readable description of the filter.
    pub fn filter_label(&self) -> String {
        match &self.filter {
            SubjectFilter::All => "all subjects".to_string(),
            SubjectFilter::Subject(s) => format!("subject: {s}"),
        }
    }
}
