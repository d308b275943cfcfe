//! DLP scanning pipeline: ingests heterogeneous files, normalizes them to
//! text, detects sensitive entities, and records findings. Detected
//! entities can be promoted into versioned Sensitive Information Types and
//! bundled into rulepacks exported as Microsoft Purview-compatible XML.
//!
//! # Pipeline
//!
//! A job hands a root path to [`processor::FileProcessor`], which walks it
//! depth-first: archives are expanded via [`ingestion::archive`], emails via
//! [`ingestion::email`], and documents via [`ingestion::documents`]. Each
//! leaf's text is run through a [`pii::PiiRecognizer`] and turned into
//! [`findings::Finding`]s by [`findings`]. [`sit`] and [`rulepack`] hold the
//! versioned detection rules findings are promoted into and the XML export
//! surface for Purview.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod findings;
pub mod ingestion;
pub mod job;
pub mod pii;
pub mod processed_cache;
pub mod processor;
pub mod rulepack;
pub mod scan_item;
pub mod sit;
pub mod vpath;

pub use error::{DlpError, Result};
