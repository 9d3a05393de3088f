use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const PROGRESS_SCHEMA_VERSION: u32 = 1;

/// Merged progress payload for one (user, course) pair, stored as a single
/// JSONB column. `time_spent_seconds` is always recomputed from
/// `lesson_times` on merge and never taken from the client payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub completed_lesson_ids: BTreeSet<String>,
    #[serde(default)]
    pub lesson_times: BTreeMap<String, i64>,
    #[serde(default)]
    pub time_spent_seconds: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_lesson_id: Option<String>,
}

fn default_version() -> u32 {
    PROGRESS_SCHEMA_VERSION
}

impl ProgressSnapshot {
    pub fn empty() -> Self {
        Self {
            version: PROGRESS_SCHEMA_VERSION,
            completed_lesson_ids: BTreeSet::new(),
            lesson_times: BTreeMap::new(),
            time_spent_seconds: 0,
            last_lesson_id: None,
        }
    }
}

/// Partial update submitted by a client. Absent fields mean "nothing new",
/// never "clear this field".
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(default)]
    pub completed_lesson_ids: Vec<String>,
    #[serde(default)]
    pub lesson_times: BTreeMap<String, i64>,
    #[serde(default)]
    pub last_lesson_id: Option<String>,
}

/// One durable row: the snapshot plus its key and the server-assigned
/// timestamp of the last successful merge.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_id: String,
    pub course_id: String,
    #[serde(flatten)]
    pub progress: ProgressSnapshot,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgressReq {
    pub user_id: String,
    pub course_id: String,
    pub progress: ProgressUpdate,
    #[serde(default)]
    pub client_updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug)]
pub struct SyncProgressResp {
    pub progress: ProgressRecord,
}

#[derive(Serialize, Debug)]
pub struct GetProgressResp {
    pub progress: Option<ProgressRecord>,
}

#[derive(Serialize, Debug)]
pub struct ListProgressResp {
    pub items: Vec<ProgressRecord>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub user_id: String,
    pub course_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: String,
}
