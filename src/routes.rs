use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::{db::Db, models::*, reconcile, store, validate};

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/api/progress/sync", post(sync_progress))
        .route("/api/progress", get(get_progress))
        .route("/api/progress/list", get(list_progress))
        .with_state(db)
}

async fn sync_progress(
    State(db): State<Db>,
    Json(req): Json<SyncProgressReq>,
) -> Result<Json<SyncProgressResp>, (StatusCode, String)> {
    validate::validate_sync(&req).map_err(|e| e400(e.to_string()))?;

    let existing = store::fetch(&db, &req.user_id, &req.course_id)
        .await
        .map_err(e500)?;
    let (baseline, baseline_updated_at) = match &existing {
        Some(rec) => (Some(&rec.progress), Some(rec.updated_at)),
        None => (None, None),
    };

    let merged = reconcile::reconcile(
        baseline,
        baseline_updated_at,
        &req.progress,
        req.client_updated_at,
    );

    // The upsert assigns updated_at = now(); two concurrent cycles for the
    // same key serialize at this write.
    let saved = store::upsert(&db, &req.user_id, &req.course_id, &merged)
        .await
        .map_err(e500)?;

    tracing::debug!(
        user_id = %saved.user_id,
        course_id = %saved.course_id,
        time_spent = saved.progress.time_spent_seconds,
        "progress merged"
    );

    Ok(Json(SyncProgressResp { progress: saved }))
}

// Absent progress is a normal outcome, not an error: the client starts from
// an empty baseline.
async fn get_progress(
    State(db): State<Db>,
    Query(q): Query<ProgressQuery>,
) -> Result<Json<GetProgressResp>, (StatusCode, String)> {
    if q.user_id.trim().is_empty() || q.course_id.trim().is_empty() {
        return Err(e400("userId and courseId are required"));
    }
    let progress = store::fetch(&db, &q.user_id, &q.course_id)
        .await
        .map_err(e500)?;
    Ok(Json(GetProgressResp { progress }))
}

async fn list_progress(
    State(db): State<Db>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ListProgressResp>, (StatusCode, String)> {
    if q.user_id.trim().is_empty() {
        return Err(e400("userId is required"));
    }
    let items = store::list_for_user(&db, &q.user_id).await.map_err(e500)?;
    Ok(Json(ListProgressResp { items }))
}

// --- helpers ---
fn e400<T: Into<String>>(msg: T) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.into())
}

fn e500<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    tracing::error!(error=%e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use sqlx::{Pool, Postgres};
    use tower::ServiceExt;

    // Lazy pool: never connects unless a handler reaches the store, which
    // the rejection paths under test must not do.
    fn test_router() -> Router {
        let db = Pool::<Postgres>::connect_lazy("postgres://localhost/unreachable")
            .expect("lazy pool");
        router(db)
    }

    fn sync_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/progress/sync")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn blank_user_id_is_rejected_before_any_read() {
        let res = test_router()
            .oneshot(sync_request(serde_json::json!({
                "userId": "",
                "courseId": "c1",
                "progress": { "completedLessonIds": ["L1"] }
            })))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("userId"));
    }

    #[tokio::test]
    async fn negative_lesson_time_is_rejected_before_any_read() {
        let res = test_router()
            .oneshot(sync_request(serde_json::json!({
                "userId": "u1",
                "courseId": "c1",
                "progress": { "lessonTimes": { "L1": -30 } }
            })))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_progress_field_is_rejected_by_the_extractor() {
        let res = test_router()
            .oneshot(sync_request(serde_json::json!({
                "userId": "u1",
                "courseId": "c1"
            })))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
