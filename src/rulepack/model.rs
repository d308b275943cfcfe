//! Rulepack and rulepack-selection records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rulepack {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub locale: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One SIT version bundled into a rulepack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulepackSelection {
    pub rulepack_id: Uuid,
    pub sit_version_id: Uuid,
}
