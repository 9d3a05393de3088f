// Store accessor for user_progress rows. The keyed ON CONFLICT upsert is
// the concurrency boundary: Postgres serializes concurrent upserts for the
// same (user_id, course_id), so the read-merge-write cycle around it needs
// no locking of its own.

use chrono::{DateTime, Utc};
use sqlx::types::Json;

use crate::db::Db;
use crate::models::{ProgressRecord, ProgressSnapshot};

#[derive(sqlx::FromRow)]
struct ProgressRow {
    user_id: String,
    course_id: String,
    progress: Json<ProgressSnapshot>,
    updated_at: DateTime<Utc>,
}

impl ProgressRow {
    fn into_record(self) -> ProgressRecord {
        ProgressRecord {
            user_id: self.user_id,
            course_id: self.course_id,
            progress: self.progress.0,
            updated_at: self.updated_at,
        }
    }
}

pub async fn fetch(
    db: &Db,
    user_id: &str,
    course_id: &str,
) -> sqlx::Result<Option<ProgressRecord>> {
    let row = sqlx::query_as::<_, ProgressRow>(
        r#"
        SELECT user_id, course_id, progress, updated_at
        FROM user_progress
        WHERE user_id = $1 AND course_id = $2
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(db)
    .await?;

    Ok(row.map(ProgressRow::into_record))
}

pub async fn upsert(
    db: &Db,
    user_id: &str,
    course_id: &str,
    merged: &ProgressSnapshot,
) -> sqlx::Result<ProgressRecord> {
    let row = sqlx::query_as::<_, ProgressRow>(
        r#"
        INSERT INTO user_progress (user_id, course_id, progress, updated_at)
        VALUES ($1, $2, $3, now())
        ON CONFLICT (user_id, course_id)
        DO UPDATE SET progress = EXCLUDED.progress, updated_at = now()
        RETURNING user_id, course_id, progress, updated_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(Json(merged))
    .fetch_one(db)
    .await?;

    Ok(row.into_record())
}

pub async fn list_for_user(db: &Db, user_id: &str) -> sqlx::Result<Vec<ProgressRecord>> {
    let rows = sqlx::query_as::<_, ProgressRow>(
        r#"
        SELECT user_id, course_id, progress, updated_at
        FROM user_progress
        WHERE user_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(ProgressRow::into_record).collect())
}
