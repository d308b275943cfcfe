//! Rulepack model, repository, and Purview-compatible XML export.

pub mod exporter;
pub mod model;
pub mod repository;

pub use model::{Rulepack, RulepackSelection};
