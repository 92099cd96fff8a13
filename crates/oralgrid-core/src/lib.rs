//! oralgrid-core — Criteria catalog, evaluation store, aggregation and export.
//!
//! This crate holds everything a front-end needs to collect scored checklists
//! for oral presentations and to summarise them: the data model, the
//! in-memory store, the satisfied/unsatisfied statistics and the JSON
//! exporter.

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod statistics;
pub mod store;
