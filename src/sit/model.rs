//! Data model for SITs, their versions, and the detection rule graph a
//! version carries (primary element, supporting logic, supporting groups).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sit {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitVersion {
    pub id: Uuid,
    pub sit_id: Uuid,
    pub version_number: u32,
    pub entity_type: Option<String>,
    pub confidence: Option<String>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub primary_element: PrimaryElement,
    pub supporting_logic: SupportingLogic,
    pub supporting_groups: Vec<SupportingGroup>,
}

/// The rule that identifies the sensitive value itself. A SIT version
/// carries exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PrimaryElement {
    Regex(String),
    Keyword(String),
}

/// How a version's supporting groups combine to corroborate a primary
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SupportingLogic {
    Any,
    All,
    MinN { min_n: u32 },
}

impl SupportingLogic {
    pub fn mode_str(&self) -> &'static str {
        match self {
            SupportingLogic::Any => "ANY",
            SupportingLogic::All => "ALL",
            SupportingLogic::MinN { .. } => "MIN_N",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportingGroup {
    pub id: Uuid,
    pub sit_version_id: Uuid,
    pub name: String,
    pub position: u32,
    pub items: Vec<SupportingItem>,
}

/// A single corroborating clue within a supporting group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SupportingItem {
    Regex { value: String },
    Keyword { value: String },
    KeywordListRef { keyword_list_id: Uuid },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordList {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<KeywordListItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordListItem {
    pub id: Uuid,
    pub keyword_list_id: Uuid,
    pub position: u32,
    pub value: String,
}
