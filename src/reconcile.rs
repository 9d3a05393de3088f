// Pure merge of a stored progress snapshot with an incoming client update.
// No I/O and no clock reads; `updated_at` is assigned by the store at
// persistence time so the same inputs always produce the same output.

use chrono::{DateTime, Utc};

use crate::models::{ProgressSnapshot, ProgressUpdate, PROGRESS_SCHEMA_VERSION};

/// Combine a possibly-absent stored snapshot with an incoming partial update.
///
/// Completed lessons are a set union and per-lesson times take the max of
/// both sides, so replaying a stale or duplicate submission can never shrink
/// recorded progress. `last_lesson_id` is last-write-wins: a client timestamp
/// older than the stored `updated_at` loses the race and the stored value is
/// kept.
pub fn reconcile(
    existing: Option<&ProgressSnapshot>,
    existing_updated_at: Option<DateTime<Utc>>,
    incoming: &ProgressUpdate,
    client_updated_at: Option<DateTime<Utc>>,
) -> ProgressSnapshot {
    let baseline = existing.cloned().unwrap_or_else(ProgressSnapshot::empty);

    let mut completed_lesson_ids = baseline.completed_lesson_ids;
    completed_lesson_ids.extend(incoming.completed_lesson_ids.iter().cloned());

    let mut lesson_times = baseline.lesson_times;
    for (lesson_id, &secs) in &incoming.lesson_times {
        let recorded = lesson_times.entry(lesson_id.clone()).or_insert(0);
        if secs > *recorded {
            *recorded = secs;
        }
    }

    // Derived, never copied from the payload.
    let time_spent_seconds = lesson_times.values().sum();

    let last_lesson_id = match client_updated_at {
        Some(client_ts) => {
            // An absent stored timestamp means there is no previous write to
            // lose the race to.
            let stale = existing_updated_at.is_some_and(|server_ts| client_ts < server_ts);
            if stale {
                baseline.last_lesson_id
            } else {
                incoming.last_lesson_id.clone().or(baseline.last_lesson_id)
            }
        }
        // No ordering evidence: whichever request reaches the server last
        // wins. Inherited behavior, kept deliberately permissive.
        None => incoming.last_lesson_id.clone().or(baseline.last_lesson_id),
    };

    ProgressSnapshot {
        version: PROGRESS_SCHEMA_VERSION,
        completed_lesson_ids,
        lesson_times,
        time_spent_seconds,
        last_lesson_id,
    }
}
